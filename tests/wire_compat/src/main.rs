fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use partwise_protocol::messages::validate_manifest;
    use partwise_protocol::{
        AbortUploadResponse, Action, CompleteUploadResponse, ControlRequest,
        CreateSessionResponse, ErrorResponse, PresignPartResponse, derive_object_key,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key-order independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    fn request(name: &str, action: Action) -> ControlRequest {
        let req: ControlRequest = roundtrip_test(name);
        assert_eq!(req.action(), action, "{name}");
        assert!(req.validate().is_ok(), "{name} should be accepted");
        req
    }

    // --- Requests ---

    #[test]
    fn fixture_create_request() {
        match request("create_request.json", Action::Create) {
            ControlRequest::Create(req) => {
                assert_eq!(req.filename, "My Clip.mp4");
                assert_eq!(req.file_type, "video/mp4");
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn fixture_presign_request() {
        match request("presign_request.json", Action::Presign) {
            ControlRequest::Presign(req) => assert_eq!(req.part_number, 2),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn fixture_complete_request() {
        match request("complete_request.json", Action::Complete) {
            ControlRequest::Complete(req) => {
                assert_eq!(req.parts.len(), 3);
                assert!(validate_manifest(&req.parts).is_ok());
                assert!(req.parts.iter().all(|p| p.etag.starts_with('"')));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn fixture_abort_request() {
        request("abort_request.json", Action::Abort);
    }

    #[test]
    fn unknown_action_rejected() {
        let json = serde_json::json!({ "action": "list", "key": "k" });
        assert!(serde_json::from_value::<ControlRequest>(json).is_err());
    }

    // --- Responses ---

    #[test]
    fn fixture_create_response() {
        let resp: CreateSessionResponse = roundtrip_test("create_response.json");
        assert_eq!(resp.upload_id, "2~fJ8nQq3kV0x");
    }

    #[test]
    fn fixture_presign_response() {
        let resp: PresignPartResponse = roundtrip_test("presign_response.json");
        assert!(resp.url.contains("partNumber=2"));
    }

    #[test]
    fn fixture_complete_response() {
        let resp: CompleteUploadResponse = roundtrip_test("complete_response.json");
        assert_eq!(resp.msg, "Upload complete");
    }

    #[test]
    fn fixture_abort_response() {
        let resp: AbortUploadResponse = roundtrip_test("abort_response.json");
        assert_eq!(resp.msg, "Aborted");
    }

    #[test]
    fn fixture_error_response() {
        let resp: ErrorResponse = roundtrip_test("error_response.json");
        assert_eq!(resp.error, "Missing presign params");
    }

    // --- Cross-checks ---

    #[test]
    fn key_in_fixtures_matches_derivation() {
        let create = load_fixture("create_request.json");
        let response: CreateSessionResponse = roundtrip_test("create_response.json");
        let key = derive_object_key(
            create["name"].as_str().unwrap(),
            create["filename"].as_str().unwrap(),
            1_700_000_000_000,
        );
        assert_eq!(key, response.key);
    }

    #[test]
    fn session_identifiers_echoed() {
        let created: CreateSessionResponse = roundtrip_test("create_response.json");
        for name in ["presign_request.json", "complete_request.json", "abort_request.json"] {
            let fixture = load_fixture(name);
            assert_eq!(fixture["uploadId"], created.upload_id.as_str(), "{name}");
            assert_eq!(fixture["key"], created.key.as_str(), "{name}");
        }
    }
}
