//! Fault injection for the in-memory backend.

use std::fmt;

use carebook_storage::StorageError;
use papaya::HashMap as PapayaHashMap;

/// An operation that can be made to fail.
///
/// Record points are keyed by collection (or procedure name for `Call`);
/// blob points by bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Select(String),
    SelectById(String),
    Insert(String),
    Update(String),
    Delete(String),
    Call(String),
    Upload(String),
    Remove(String),
    SignedUrl(String),
}

impl FailPoint {
    pub fn select(collection: impl Into<String>) -> Self {
        Self::Select(collection.into())
    }

    pub fn select_by_id(collection: impl Into<String>) -> Self {
        Self::SelectById(collection.into())
    }

    pub fn insert(collection: impl Into<String>) -> Self {
        Self::Insert(collection.into())
    }

    pub fn update(collection: impl Into<String>) -> Self {
        Self::Update(collection.into())
    }

    pub fn delete(collection: impl Into<String>) -> Self {
        Self::Delete(collection.into())
    }

    pub fn call(procedure: impl Into<String>) -> Self {
        Self::Call(procedure.into())
    }

    pub fn upload(bucket: impl Into<String>) -> Self {
        Self::Upload(bucket.into())
    }

    pub fn remove(bucket: impl Into<String>) -> Self {
        Self::Remove(bucket.into())
    }

    pub fn signed_url(bucket: impl Into<String>) -> Self {
        Self::SignedUrl(bucket.into())
    }
}

impl fmt::Display for FailPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(c) => write!(f, "select {c}"),
            Self::SelectById(c) => write!(f, "select_by_id {c}"),
            Self::Insert(c) => write!(f, "insert {c}"),
            Self::Update(c) => write!(f, "update {c}"),
            Self::Delete(c) => write!(f, "delete {c}"),
            Self::Call(p) => write!(f, "call {p}"),
            Self::Upload(b) => write!(f, "upload {b}"),
            Self::Remove(b) => write!(f, "remove {b}"),
            Self::SignedUrl(b) => write!(f, "signed_url {b}"),
        }
    }
}

/// Set of armed fail points.
#[derive(Debug, Default)]
pub(crate) struct Faults {
    armed: PapayaHashMap<FailPoint, ()>,
}

impl Faults {
    pub(crate) fn arm(&self, point: FailPoint) {
        self.armed.pin().insert(point, ());
    }

    pub(crate) fn disarm(&self, point: &FailPoint) {
        self.armed.pin().remove(point);
    }

    pub(crate) fn clear(&self) {
        self.armed.pin().clear();
    }

    /// Fails with a connection error when `point` is armed.
    pub(crate) fn check(&self, point: FailPoint) -> Result<(), StorageError> {
        if self.armed.pin().contains_key(&point) {
            tracing::debug!(%point, "injected failure");
            return Err(StorageError::connection(format!("injected failure: {point}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armed_point_fails_until_disarmed() {
        let faults = Faults::default();
        assert!(faults.check(FailPoint::insert("patients")).is_ok());

        faults.arm(FailPoint::insert("patients"));
        let err = faults.check(FailPoint::insert("patients")).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Connection error: injected failure: insert patients");
        // other collections are unaffected
        assert!(faults.check(FailPoint::insert("appointments")).is_ok());

        faults.disarm(&FailPoint::insert("patients"));
        assert!(faults.check(FailPoint::insert("patients")).is_ok());
    }

    #[test]
    fn test_clear_disarms_everything() {
        let faults = Faults::default();
        faults.arm(FailPoint::upload("patient-files"));
        faults.arm(FailPoint::call("increment_patient_treatments"));
        faults.clear();
        assert!(faults.check(FailPoint::upload("patient-files")).is_ok());
        assert!(faults.check(FailPoint::call("increment_patient_treatments")).is_ok());
    }
}
