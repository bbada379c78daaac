/// Upper bound on the key length, in bytes. DynamoDB allows 2048 for a partition key.
const MAX_KEY_LEN: usize = 1024;

/// Identifier of a counter record in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey(String);

impl AsRef<str> for CounterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CounterKey {
    type Error = String;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        if key.trim().is_empty() {
            return Err("counter key must not be empty".into());
        }

        if key.len() > MAX_KEY_LEN {
            return Err(format!(
                "counter key is too long: {} bytes, at most {MAX_KEY_LEN} allowed",
                key.len()
            ));
        }

        Ok(Self(key))
    }
}

impl TryFrom<&str> for CounterKey {
    type Error = String;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        key.to_string().try_into()
    }
}
