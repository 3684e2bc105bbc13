//! Shared fixtures: a throwaway root → intermediate → leaf PKI and a
//! loopback TLS server presenting a chosen chain.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    Issuer, KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use pin_authorizer::chain::{ChainRetriever, der_to_pem};
use pin_authorizer::source::PinSource;
use pin_authorizer::{Error, PinSet, Result, RetrievedChain};

// ─────────────────────────────────────────────────────────────────────────────
// PKI
// ─────────────────────────────────────────────────────────────────────────────

/// Root, intermediate and leaf certificates plus the leaf key.
pub struct TestPki {
    pub root: CertificateDer<'static>,
    pub intermediate: CertificateDer<'static>,
    pub leaf: CertificateDer<'static>,
    pub leaf_key: PrivateKeyDer<'static>,
}

impl TestPki {
    /// Mint a fresh chain whose leaf is valid for `dns_name`.
    ///
    /// CA names embed `dns_name`, so two PKIs for the same name share
    /// subjects but not keys.
    pub fn generate(dns_name: &str) -> Self {
        let root_key = KeyPair::generate().unwrap();
        let root_params = ca_params(&format!("Pin Authorizer Test Root ({dns_name})"));
        let root = root_params.self_signed(&root_key).unwrap();
        let root_issuer = Issuer::new(root_params, root_key);

        let int_key = KeyPair::generate().unwrap();
        let int_params = ca_params(&format!("Pin Authorizer Test Intermediate ({dns_name})"));
        let intermediate = int_params.signed_by(&int_key, &root_issuer).unwrap();
        let int_issuer = Issuer::new(int_params, int_key);

        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params = CertificateParams::new(vec![dns_name.to_string()]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, dns_name);
        leaf_params.distinguished_name = dn;
        leaf_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        let leaf = leaf_params.signed_by(&leaf_key, &int_issuer).unwrap();

        Self {
            root: root.der().clone(),
            intermediate: intermediate.der().clone(),
            leaf: leaf.der().clone(),
            leaf_key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der())),
        }
    }

    /// PEM text of leaf, intermediate and root.
    pub fn pems(&self) -> [String; 3] {
        [
            der_to_pem(self.leaf.as_ref()),
            der_to_pem(self.intermediate.as_ref()),
            der_to_pem(self.root.as_ref()),
        ]
    }

    /// Pins for `host:port` matching this PKI.
    pub fn pins(&self, host: &str, port: u16) -> PinSet {
        let [leaf, int, root] = self.pems();
        PinSet::new(host, i64::from(port), &leaf, &int, &root).unwrap()
    }
}

fn ca_params(cn: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params
}

// ─────────────────────────────────────────────────────────────────────────────
// TLS server
// ─────────────────────────────────────────────────────────────────────────────

/// Serve TLS on a loopback port, presenting `chain` with the PKI's leaf key.
pub async fn spawn_tls_server(pki: &TestPki, chain: Vec<CertificateDer<'static>>) -> SocketAddr {
    spawn_tls_server_with_versions(pki, chain, rustls::DEFAULT_VERSIONS).await
}

/// Like [`spawn_tls_server`], restricted to the given protocol versions.
pub async fn spawn_tls_server_with_versions(
    pki: &TestPki,
    chain: Vec<CertificateDer<'static>>,
    versions: &[&'static rustls::SupportedProtocolVersion],
) -> SocketAddr {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_protocol_versions(versions)
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(chain, pki.leaf_key.clone_key())
    .unwrap();

    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    // Hold the connection until the client closes it
                    let mut buf = [0u8; 64];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    addr
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator doubles
// ─────────────────────────────────────────────────────────────────────────────

/// Pin source returning a fixed pin set or a fixed secret error.
pub struct FixedPins(pub std::result::Result<PinSet, String>);

#[async_trait]
impl PinSource for FixedPins {
    async fn load(&self) -> Result<PinSet> {
        match &self.0 {
            Ok(pins) => Ok(pins.clone()),
            Err(reason) => Err(Error::Secret(reason.clone())),
        }
    }
}

/// Retriever returning a fixed chain and counting calls.
pub struct FixedChain {
    pub chain: RetrievedChain,
    pub calls: AtomicUsize,
}

impl FixedChain {
    pub fn new(entries: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            chain: RetrievedChain::from_entries(entries.iter().map(|s| (*s).to_owned()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRetriever for FixedChain {
    async fn retrieve(&self, _host: &str, _port: u16) -> RetrievedChain {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chain.clone()
    }
}
