use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PolicyId);
id_newtype!(ClaimId);
id_newtype!(ChainId);

impl ChainId {
    /// Hex encoding used on the provider wire (`0x7a69` for 31337).
    pub fn as_hex(&self) -> String {
        format!("{:#x}", self.0)
    }
}

/// Account or contract address. Wallets report addresses in mixed
/// (checksummed) case while contracts report lowercase; equality must not
/// depend on that, so the string is normalized to lowercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated `0x1234…abcd` form for summaries. Addresses are expected
    /// to be ASCII hex, but construction does not enforce that, so anything
    /// that cannot be split cleanly is returned whole.
    pub fn short(&self) -> String {
        let tail = self.0.len().saturating_sub(4);
        if self.0.len() <= 10 || !self.0.is_char_boundary(6) || !self.0.is_char_boundary(tail) {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[tail..])
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash as reported by the signing provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_equality_ignores_case() {
        assert_eq!(Address::new("0xABCdef"), Address::new("0xabcDEF"));
    }

    #[test]
    fn address_deserializes_normalized() {
        let addr: Address = serde_json::from_str("\"0xF39Fd6e51aad\"").expect("address");
        assert_eq!(addr.as_str(), "0xf39fd6e51aad");
    }

    #[test]
    fn short_form_keeps_prefix_and_suffix() {
        let addr = Address::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(addr.short(), "0xf39f…2266");
    }

    #[test]
    fn short_form_leaves_tiny_addresses_alone() {
        assert_eq!(Address::new("0xabc").short(), "0xabc");
    }

    #[test]
    fn short_form_returns_non_hex_input_whole() {
        // Multibyte characters across either split point must not panic.
        let head = Address::new("0xabcé0123456789");
        assert_eq!(head.short(), head.as_str());
        let tail = Address::new("0x012345678é123");
        assert_eq!(tail.short(), tail.as_str());
    }

    #[test]
    fn chain_id_hex_encoding() {
        assert_eq!(ChainId(31337).as_hex(), "0x7a69");
    }
}
