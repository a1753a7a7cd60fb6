//! Partition tokens and native paging state.
//!
//! Rows are scanned in partition-token order, with ties broken by the key's
//! file name. The paging state records the position of the last row
//! returned:
//!
//! ```text
//! [version: u8 = 1][token: i64 BE][key length: u16 BE][key bytes]
//! ```

use std::cmp::Ordering;

use userbase_core::PagingState;
use userbase_core::Result;
use userbase_core::error::QueryError;

const STATE_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 8 + 2;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The partition token of a row key (FNV-1a, reinterpreted as signed).
pub fn partition_token(key: &str) -> i64 {
    let hash = key.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    i64::from_be_bytes(hash.to_be_bytes())
}

/// A position in token order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPosition {
    pub token: i64,
    pub key: String,
}

impl ScanPosition {
    pub fn of(key: &str) -> Self {
        Self {
            token: partition_token(key),
            key: key.to_string(),
        }
    }

    pub fn encode(&self) -> Result<PagingState> {
        let key = self.key.as_bytes();
        let len = u16::try_from(key.len()).map_err(|_| QueryError::InvalidPagingState {
            reason: format!("row key of {} bytes is too long to page over", key.len()),
        })?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + key.len());
        bytes.push(STATE_VERSION);
        bytes.extend_from_slice(&self.token.to_be_bytes());
        bytes.extend_from_slice(&len.to_be_bytes());
        bytes.extend_from_slice(key);
        Ok(PagingState::new(bytes))
    }

    pub fn decode(state: &PagingState) -> Result<Self> {
        let bytes = state.as_bytes();
        if bytes.len() < HEADER_LEN {
            return Err(invalid(format!("{} bytes is too short", bytes.len())));
        }
        if bytes[0] != STATE_VERSION {
            return Err(invalid(format!("unknown version {}", bytes[0])));
        }

        let mut token = [0u8; 8];
        token.copy_from_slice(&bytes[1..9]);
        let token = i64::from_be_bytes(token);
        let len = usize::from(u16::from_be_bytes([bytes[9], bytes[10]]));

        let key = &bytes[HEADER_LEN..];
        if key.len() != len {
            return Err(invalid(format!(
                "key length {} does not match {} remaining bytes",
                len,
                key.len()
            )));
        }
        let key = std::str::from_utf8(key)
            .map_err(|_| invalid("key is not UTF-8".to_string()))?
            .to_string();

        // A state whose token does not belong to its key was not produced here.
        if partition_token(&key) != token {
            return Err(invalid("token does not match key".to_string()));
        }

        Ok(Self { token, key })
    }
}

impl Ord for ScanPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token
            .cmp(&other.token)
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for ScanPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn invalid(reason: String) -> userbase_core::Error {
    QueryError::InvalidPagingState { reason }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_reference_values() {
        assert_eq!(partition_token(""), FNV_OFFSET as i64);
        assert_eq!(partition_token("a") as u64, 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn state_round_trip() {
        let pos = ScanPosition::of("3f2b7c1e-0000-4000-8000-000000000001");
        let state = pos.encode().unwrap();
        assert_eq!(state.as_bytes()[0], STATE_VERSION);
        assert_eq!(ScanPosition::decode(&state).unwrap(), pos);
    }

    #[test]
    fn rejects_truncated_state() {
        let state = ScanPosition::of("abc").encode().unwrap();
        let truncated = PagingState::new(&state.as_bytes()[..state.as_bytes().len() - 1]);
        assert!(ScanPosition::decode(&truncated).is_err());
        assert!(ScanPosition::decode(&PagingState::new(vec![1, 2])).is_err());
    }

    #[test]
    fn rejects_forged_token() {
        let mut bytes = ScanPosition::of("abc").encode().unwrap().into_bytes();
        bytes[4] ^= 0xff;
        assert!(ScanPosition::decode(&PagingState::new(bytes)).is_err());
    }

    #[test]
    fn orders_by_token_then_key() {
        let a = ScanPosition { token: 1, key: "b".into() };
        let b = ScanPosition { token: 1, key: "c".into() };
        let c = ScanPosition { token: -5, key: "z".into() };
        let mut positions = vec![a.clone(), b.clone(), c.clone()];
        positions.sort();
        assert_eq!(positions, [c, a, b]);
    }
}
