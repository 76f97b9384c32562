//! Third-party services the backend consults over their published REST
//! APIs: an identity provider for federated sign-in and an image host for
//! uploads.

pub mod cloudinary;
pub mod firebase;
pub mod outbound;

pub use cloudinary::CloudinaryHost;
pub use firebase::FirebaseIdentity;

/// Profile asserted by the identity provider for a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct FederatedProfile {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn verify(&self, token: &str) -> anyhow::Result<FederatedProfile>;
}

#[allow(async_fn_in_trait)]
pub trait MediaHost {
    /// Stores a `data:` URI image and returns its public URL.
    async fn upload(&self, data_uri: &str) -> anyhow::Result<String>;
}
