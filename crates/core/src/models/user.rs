use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Account role reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Regular customer. Unknown role strings also land here.
    #[default]
    Guest,
    /// Hotel owner allowed to manage listings.
    HotelOwner,
}

impl Role {
    /// Wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::HotelOwner => "hotelOwner",
        }
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("hotelOwner") => Role::HotelOwner,
            _ => Role::Guest,
        })
    }
}

/// Profile of the signed-in user as returned by `user-details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier.
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Display name.
    #[serde(alias = "username", default)]
    pub name: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Account role.
    #[serde(default)]
    pub role: Role,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl UserProfile {
    /// Whether the profile belongs to a hotel owner.
    pub fn is_owner(&self) -> bool {
        self.role == Role::HotelOwner
    }
}
