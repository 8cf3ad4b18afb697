use std::collections::HashMap;

use election_client::{
    checksum::ChecksumResourceFetcher,
    election::CandidateDetails,
    ClientError, ResourceVerificationError,
};

use crate::utils::{
    fixtures::{checksum_url, open_election},
    servers::spawn_resource_server,
};

fn candidate_json(name: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "name": name,
        "imageUrl": format!("https://img.example/{}.png", name),
        "descriptionUrl": null
    }))
    .unwrap()
}

#[tokio::test]
async fn test_only_verified_candidates_are_listed() {
    let alice = candidate_json("Alice");
    let bob = candidate_json("Bob");
    let blank = candidate_json("   ");
    let carol = candidate_json("Carol");
    let files: HashMap<String, Vec<u8>> = [
        ("alice.json", alice.clone()),
        // Served bytes differ from what the contract anchored.
        ("bob.json", candidate_json("Mallory")),
        ("blank.json", blank.clone()),
        ("carol.json", carol.clone()),
    ]
    .into_iter()
    .map(|(name, bytes)| (name.to_string(), bytes))
    .collect();
    let base = spawn_resource_server(files).await;

    let config = open_election(vec![
        checksum_url(&base, "alice.json", &alice),
        checksum_url(&base, "bob.json", &bob),
        checksum_url(&base, "blank.json", &blank),
        checksum_url(&base, "missing.json", b"{}"),
        checksum_url(&base, "carol.json", &carol),
    ]);

    let candidates = ChecksumResourceFetcher::new(reqwest::Client::new())
        .fetch_candidates(&config)
        .await;

    let listed: Vec<(usize, &str)> = candidates
        .iter()
        .map(|c| (c.index, c.details.name.as_str()))
        .collect();
    assert_eq!(listed, vec![(0, "Alice"), (4, "Carol")]);
}

#[tokio::test]
async fn test_tampered_resource_reports_both_digests() {
    let anchored = candidate_json("Alice");
    let served = candidate_json("Eve");
    let base = spawn_resource_server(HashMap::from([(
        "alice.json".to_string(),
        served.clone(),
    )]))
    .await;
    let resource = checksum_url(&base, "alice.json", &anchored);

    let err = ChecksumResourceFetcher::new(reqwest::Client::new())
        .fetch_verified::<CandidateDetails>(&resource)
        .await
        .unwrap_err();

    match err {
        ClientError::Verification(ResourceVerificationError::ChecksumMismatch {
            url,
            expected,
            actual,
        }) => {
            assert_eq!(url, resource.url);
            assert_eq!(expected, resource.hash_hex());
            assert_eq!(actual, hex::encode(crate::utils::fixtures::sha256(&served)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_matching_resource_is_parsed() {
    let bytes = candidate_json("Alice");
    let base = spawn_resource_server(HashMap::from([("alice.json".to_string(), bytes.clone())])).await;
    let resource = checksum_url(&base, "alice.json", &bytes);

    let details: CandidateDetails = ChecksumResourceFetcher::new(reqwest::Client::new())
        .fetch_verified(&resource)
        .await
        .unwrap();
    assert_eq!(details.name, "Alice");
}

#[tokio::test]
async fn test_oversized_resource_is_refused() {
    let bytes = candidate_json("A candidate with a rather long name");
    let base = spawn_resource_server(HashMap::from([("big.json".to_string(), bytes.clone())])).await;
    let resource = checksum_url(&base, "big.json", &bytes);

    let err = ChecksumResourceFetcher::new(reqwest::Client::new())
        .with_max_bytes(16)
        .fetch_verified::<CandidateDetails>(&resource)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::BodyTooLarge { limit: 16, .. }));
}
