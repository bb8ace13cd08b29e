//! Core traits shared by domain entities

/// Primary key type
pub type Id = i64;

/// Trait for entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Option<Id>;
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        id: Option<Id>,
    }

    impl Identifiable for Dummy {
        fn id(&self) -> Option<Id> {
            self.id
        }
    }

    #[test]
    fn test_persistence_flags() {
        let fresh = Dummy { id: None };
        assert!(fresh.is_new_record());
        assert!(!fresh.is_persisted());

        let saved = Dummy { id: Some(3) };
        assert!(saved.is_persisted());
    }
}
