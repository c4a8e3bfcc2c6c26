//! Owner record.

/// Row id of an owner.
pub type OwnerId = i64;

/// Cat owner. `last_name` is the key used to reference an owner from a cat
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: OwnerId,
    pub first_name: String,
    pub last_name: String,
}

/// Insert shape for a new owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
}

impl Owner {
    /// Display name derived from first and last name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::Owner;

    fn owner(first_name: &str, last_name: &str) -> Owner {
        Owner {
            id: 1,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    #[test]
    fn full_name_joins_both_parts() {
        assert_eq!(owner("Ann", "Smith").full_name(), "Ann Smith");
    }

    #[test]
    fn full_name_has_no_dangling_space() {
        assert_eq!(owner("", "Smith").full_name(), "Smith");
        assert_eq!(owner("Ann", "").full_name(), "Ann");
    }
}
