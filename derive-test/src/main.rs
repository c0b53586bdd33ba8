use argstash::ArgumentParser;

fn main() {
    let data = r#"
    {
        "description": "example using serde",
        "prefix_chars": "-+",
        "args": [{
            "name": "verbose",
            "alternative_name": "v",
            "action": "store_true"
        }, {
            "name": "output",
            "alternative_name": "o",
            "default": "out.txt",
            "description": "where to write"
        }]
    }"#;

    let parser: ArgumentParser = serde_json::from_str(data).unwrap();
    match parser.parse_env() {
        Ok(results) => println!("{:?}", results),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use argstash::{Action, ArgumentParser, Value};

    #[test]
    fn test_deserialize() {
        let data = r#"
        {
            "description": "derive-test",
            "args": [{
                "name": "color",
                "action": "store_false"
            }, {
                "name": "jobs",
                "alternative_name": "j",
                "default": 4,
                "action": "store"
            }, {
                "name": "ratio",
                "default": 0.5
            }]
        }"#;

        let parser: ArgumentParser = serde_json::from_str(data).unwrap();
        assert_eq!("-", parser.prefix_chars);
        assert_eq!(Action::StoreFalse, parser.args[0].action);
        assert_eq!(Some(Value::Int(4)), parser.args[1].default);
        assert_eq!(Some(Value::Float(0.5)), parser.args[2].default);

        let results = parser.parse(vec!["-j", "8", "--color"]).unwrap();
        assert_eq!(Some(&Value::Int(8)), results.get("jobs"));
        assert_eq!(Some(&Value::Bool(false)), results.get("color"));
        assert_eq!(Some(&Value::Float(0.5)), results.get("ratio"));
    }

    #[test]
    fn test_deserialize_duplicates_fail_on_parse() {
        let data = r#"{ "args": [{ "name": "a" }, { "name": "a" }] }"#;
        let parser: ArgumentParser = serde_json::from_str(data).unwrap();
        assert!(parser.parse(Vec::<&str>::new()).is_err());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let data = r#"{ "args": [{ "name": "a", "action": "append" }] }"#;
        assert!(serde_json::from_str::<ArgumentParser>(data).is_err());
    }
}
