pub mod auth;
pub mod region;

pub use auth::{AwsAuthentication, ImdsAuthentication};
use aws_config::{BehaviorVersion, meta::region::ProvideRegion, retry::RetryConfig};
use aws_types::{SdkConfig, region::Region};
pub use region::RegionOrEndpoint;

/// Builds a service client out of a fully resolved [`SdkConfig`].
pub trait ClientBuilder {
    type Client;

    fn build(config: &SdkConfig) -> Self::Client;
}

pub async fn resolve_region(region: Option<Region>) -> crate::Result<Region> {
    match region {
        Some(region) => Ok(region),
        None => aws_config::default_provider::region::default_provider()
            .region()
            .await
            .ok_or_else(|| {
                "Could not determine region from configuration or default providers".into()
            }),
    }
}

pub async fn create_client<T: ClientBuilder>(
    auth: &AwsAuthentication,
    region: Option<Region>,
    endpoint: Option<String>,
) -> crate::Result<T::Client> {
    // The default credentials chains will look for a region if not given but we'd like to
    // error up front if later SDK calls will fail due to lack of region configuration
    let region = resolve_region(region).await?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(auth.credentials_provider(region.clone()).await?)
        .region(region)
        .retry_config(RetryConfig::disabled());

    if let Some(endpoint_override) = endpoint {
        loader = loader.endpoint_url(endpoint_override);
    }

    let config = loader.load().await;

    Ok(T::build(&config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_region_wins() {
        let region = resolve_region(Some(Region::new("eu-west-1"))).await.unwrap();
        assert_eq!(region.as_ref(), "eu-west-1");
    }
}
