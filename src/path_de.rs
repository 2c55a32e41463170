use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_carry_the_json_path() {
        let err = from_str_with_path::<serde_json::Value>("{\"a\": [1, }").unwrap_err();
        assert!(err.starts_with("at JSON path"));
        let ok: serde_json::Value = from_str_with_path("{\"a\": [1, 2]}").unwrap();
        assert_eq!(ok["a"][1], 2);
    }
}
