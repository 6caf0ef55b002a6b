//! Selector resolution against an in-memory certificate store.

mod common;

use acm_certificate_sync::prelude::*;
use common::{generate_certificate, stored_with_leaf_echo, InMemoryCertificateStore};

#[tokio::test]
async fn test_arn_selector_returns_at_most_one() {
    let store = InMemoryCertificateStore::new();
    let cert = generate_certificate("acm.example.com");
    let arn = store
        .seed(stored_with_leaf_echo(&cert, "my_cert", "acm.example.com"))
        .await;

    let matched = find_certificates(&store, &CertificateSelector::Arn(arn.clone()))
        .await
        .expect("find");
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].certificate_arn, arn);
}

#[tokio::test]
async fn test_unknown_arn_matches_nothing() {
    let store = InMemoryCertificateStore::new();

    let matched = find_certificates(
        &store,
        &CertificateSelector::Arn("arn:aws:acm:ap-southeast-2:123456789012:certificate/missing".to_string()),
    )
    .await
    .expect("an unknown arn is not an error");
    assert!(matched.is_empty());
}

#[tokio::test]
async fn test_name_tag_selector_requires_exact_value() {
    let store = InMemoryCertificateStore::new();
    let cert = generate_certificate("acm.example.com");
    let wanted = store
        .seed(stored_with_leaf_echo(&cert, "my_cert", "acm.example.com"))
        .await;
    store
        .seed(stored_with_leaf_echo(&cert, "my_cert_2", "acm.example.com"))
        .await;
    store
        .seed(stored_with_leaf_echo(&cert, "other", "acm.example.com"))
        .await;

    let matched = find_certificates(
        &store,
        &CertificateSelector::NameTag("my_cert".to_string()),
    )
    .await
    .expect("find");
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].certificate_arn, wanted);
}

#[tokio::test]
async fn test_name_tag_selector_collects_duplicates() {
    let store = InMemoryCertificateStore::new();
    let cert = generate_certificate("acm.example.com");
    store
        .seed(stored_with_leaf_echo(&cert, "dup", "acm.example.com"))
        .await;
    store
        .seed(stored_with_leaf_echo(&cert, "dup", "acm.example.com"))
        .await;

    let matched = find_certificates(&store, &CertificateSelector::NameTag("dup".to_string()))
        .await
        .expect("find");
    assert_eq!(matched.len(), 2);
}

#[tokio::test]
async fn test_domain_selector_filters_on_decoded_domain() {
    let store = InMemoryCertificateStore::new();
    let cert = generate_certificate("a.example.com");
    let wanted = store
        .seed(stored_with_leaf_echo(&cert, "a", "a.example.com"))
        .await;
    store
        .seed(stored_with_leaf_echo(&cert, "b", "b.example.com"))
        .await;

    let matched = find_certificates(
        &store,
        &CertificateSelector::DomainName("a.example.com".to_string()),
    )
    .await
    .expect("find");
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].certificate_arn, wanted);
}

#[tokio::test]
async fn test_untagged_records_never_match_a_name_tag() {
    let store = InMemoryCertificateStore::new();
    let cert = generate_certificate("acm.example.com");
    store
        .seed(common::StoredCertificate {
            certificate: Some(cert.certificate.clone()),
            certificate_chain: Some(cert.certificate.clone()),
            tags: std::collections::HashMap::new(),
            domain_name: "acm.example.com".to_string(),
        })
        .await;

    let matched = find_certificates(&store, &CertificateSelector::NameTag(String::new()))
        .await
        .expect("find");
    assert!(matched.is_empty());
}
