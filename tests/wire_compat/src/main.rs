fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use traybridge_protocol::messages::{GetBoundsRequest, SetContextMenuRequest};
    use traybridge_protocol::{
        Bounds, MethodCall, MethodResponse, Reply, Request, TrayMethod, TrayNotification,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture_text(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&load_fixture_text(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// Dart encodes `50.0` as `50`, Rust serializes `f64` as `50.0`.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Parses a fixture from its text, re-serializes it, and compares the JSON
    /// values (order-independent, float-normalized comparison).
    ///
    /// Parsing from text rather than from a `Value` keeps `RawValue` fields
    /// working.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let text = load_fixture_text(name);
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  Dart: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Requests ---

    #[test]
    fn fixture_set_icon_request() {
        let request = roundtrip_test::<Request>("set_icon_request.json");
        let (id, call) = request.into_parts();
        assert_eq!(id, "1");

        match TrayMethod::from_call(&call).unwrap() {
            TrayMethod::SetIcon(args) => {
                assert!(args.icon_path.ends_with("tray_icon.ico"));
            }
            other => panic!("unexpected method {other:?}"),
        }
    }

    #[test]
    fn fixture_set_context_menu_arguments() {
        let args = roundtrip_test::<SetContextMenuRequest>("set_context_menu_arguments.json");
        let items = &args.menu_items;
        assert_eq!(items.len(), 4);
        assert!(items[1].is_separator_item);
        assert!(!items[2].is_enabled);
        assert_eq!(items[3].identifier, "exit_app");
    }

    #[test]
    fn set_context_menu_accepts_sparse_items() {
        let json = r#"{"menuItems":[{"identifier":"a","title":"A"},{"identifier":"s","isSeparatorItem":true}]}"#;
        let args: SetContextMenuRequest = serde_json::from_str(json).unwrap();
        assert!(args.menu_items[0].is_enabled);
        assert!(!args.menu_items[0].is_separator_item);
        assert_eq!(args.menu_items[1].title, "");
    }

    #[test]
    fn fixture_get_bounds_arguments() {
        let args = roundtrip_test::<GetBoundsRequest>("get_bounds_arguments.json");
        assert_eq!(args.device_pixel_ratio, 1.5);
    }

    // --- Replies ---

    #[test]
    fn fixture_bounds() {
        let bounds = roundtrip_test::<Bounds>("bounds.json");
        assert_eq!(bounds.width, 20.0);
        assert_eq!(bounds.height, 16.0);
    }

    #[test]
    fn fixture_reply_success_bounds() {
        let reply = roundtrip_test::<Reply>("reply_success_bounds.json");
        assert_eq!(reply.id, "4");
        let result = reply.response.result().cloned().unwrap();
        let bounds: Bounds = serde_json::from_value(result).unwrap();
        assert_eq!(bounds.x, 50.0);
    }

    #[test]
    fn fixture_reply_error() {
        let reply = roundtrip_test::<Reply>("reply_error.json");
        match reply.response {
            MethodResponse::Error { code, details, .. } => {
                assert_eq!(code, "no-tray-icon");
                assert!(details.is_none());
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn fixture_reply_not_implemented() {
        let reply = roundtrip_test::<Reply>("reply_not_implemented.json");
        assert_eq!(reply.response, MethodResponse::NotImplemented);
    }

    #[test]
    fn set_icon_reply_matches_dart_expectation() {
        let reply = Reply::new("1", MethodResponse::success(&true).unwrap());
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({ "id": "1", "status": "success", "result": true })
        );
    }

    // --- Notifications ---

    #[test]
    fn fixture_menu_item_click_notification() {
        let call = roundtrip_test::<MethodCall>("menu_item_click_notification.json");
        assert_eq!(
            TrayNotification::from_call(&call).unwrap(),
            TrayNotification::menu_item_click("exit_app")
        );
    }

    #[test]
    fn fixture_icon_mouse_down_notification() {
        let call = roundtrip_test::<MethodCall>("icon_mouse_down_notification.json");
        let notification = TrayNotification::from_call(&call).unwrap();
        assert_eq!(notification, TrayNotification::IconMouseDown);

        let encoded = serde_json::to_value(notification.to_call().unwrap()).unwrap();
        assert_eq!(encoded, load_fixture("icon_mouse_down_notification.json"));
    }

    #[test]
    fn notifications_are_not_accepted_as_methods() {
        let call = roundtrip_test::<MethodCall>("menu_item_click_notification.json");
        assert!(TrayMethod::from_call(&call).is_err());
    }
}
