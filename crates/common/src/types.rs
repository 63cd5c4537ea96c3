use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a local booking shell.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// locally generated ids with identifiers owned by the upstream
/// scheduling provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellId(Uuid);

impl ShellId {
    /// Creates a new random shell ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a shell ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ShellId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ShellId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ShellId> for Uuid {
    fn from(id: ShellId) -> Self {
        id.0
    }
}

/// Unique identifier for a persisted reservation attempt.
///
/// Generated fresh on the attempt that succeeds; never reused across
/// retries of the same logical reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random reservation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a reservation ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a newtype over `String` for an identifier owned by an
/// external collaborator (the scheduling provider, the identity
/// service, or the service catalog). These are opaque to this
/// subsystem and never minted locally.
macro_rules! external_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

external_id! {
    /// Booking identifier assigned by the upstream scheduling provider.
    ExternalBookingId
}

external_id! {
    /// Invoice identifier assigned by the upstream scheduling provider.
    InvoiceId
}

external_id! {
    /// Invoice line identifier assigned by the upstream scheduling provider.
    InvoiceItemId
}

external_id! {
    /// Guest identity owned by the identity service.
    GuestId
}

external_id! {
    /// Clinic center identity owned by the catalog service.
    CenterId
}

external_id! {
    /// Service catalog item identity.
    ServiceItemId
}

external_id! {
    /// Staff/therapist identity owned by the catalog service.
    TherapistId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_id_new_creates_unique_ids() {
        let id1 = ShellId::new();
        let id2 = ShellId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn reservation_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = ReservationId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn external_id_serializes_transparently() {
        let id = ExternalBookingId::new("B123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"B123\"");
        let back: ExternalBookingId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn guest_id_display_matches_inner() {
        let id = GuestId::new("G1");
        assert_eq!(id.to_string(), "G1");
        assert_eq!(id.as_str(), "G1");
    }
}
