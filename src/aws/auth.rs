use std::time::Duration;

use aws_config::{
    environment::EnvironmentVariableCredentialsProvider,
    imds::{self, credentials::ImdsCredentialsProvider},
    meta::credentials::CredentialsProviderChain,
    profile::ProfileFileCredentialsProvider,
    sts::AssumeRoleProvider,
};
use aws_credential_types::{Credentials, provider::SharedCredentialsProvider};
use aws_types::region::Region;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::sensitive_string::SensitiveString;

const ASSUME_ROLE_SESSION_NAME: &str = "cloudwatch-metrics";

/// IMDS Client Configuration for authenticating with AWS.
#[serde_as]
#[derive(Copy, Clone, Debug, Derivative, Deserialize, Serialize, PartialEq, Eq)]
#[derivative(Default)]
#[serde(deny_unknown_fields)]
pub struct ImdsAuthentication {
    /// Number of IMDS retries for fetching tokens and metadata.
    #[serde(default = "default_max_attempts")]
    #[derivative(Default(value = "default_max_attempts()"))]
    max_attempts: u32,

    /// Connect timeout for IMDS.
    #[serde(default = "default_timeout")]
    #[serde(rename = "connect_timeout_seconds")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[derivative(Default(value = "default_timeout()"))]
    connect_timeout: Duration,

    /// Read timeout for IMDS.
    #[serde(default = "default_timeout")]
    #[serde(rename = "read_timeout_seconds")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[derivative(Default(value = "default_timeout()"))]
    read_timeout: Duration,
}

const fn default_max_attempts() -> u32 {
    4
}

const fn default_timeout() -> Duration {
    Duration::from_secs(1)
}

/// Configuration of the authentication strategy for interacting with AWS services.
#[derive(Clone, Debug, Derivative, Deserialize, Serialize, PartialEq, Eq)]
#[derivative(Default)]
#[serde(deny_unknown_fields, untagged)]
pub enum AwsAuthentication {
    /// Authenticate using a fixed access key and secret pair.
    AccessKey {
        /// The AWS access key ID.
        access_key_id: SensitiveString,

        /// The AWS secret access key.
        secret_access_key: SensitiveString,

        /// The AWS session token.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<SensitiveString>,
    },

    /// Assume the given role ARN, using the default chain for the source credentials.
    Role {
        /// The ARN of an [IAM role][iam_role] to assume.
        ///
        /// [iam_role]: https://docs.aws.amazon.com/IAM/latest/UserGuide/id_roles.html
        assume_role: String,

        /// Configuration for authenticating with AWS through IMDS.
        #[serde(default)]
        imds: ImdsAuthentication,

        /// The [AWS region][aws_region] to send STS requests to.
        ///
        /// If not set, this defaults to the configured region for the service itself.
        ///
        /// [aws_region]: https://docs.aws.amazon.com/general/latest/gr/rande.html#regional-endpoints
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
    },

    /// Default authentication strategy, which tries the instance role (through IMDS), then
    /// the environment, then the shared credentials profile.
    #[derivative(Default)]
    Default {
        /// Configuration for authenticating with AWS through IMDS.
        #[serde(default)]
        imds: ImdsAuthentication,
    },
}

impl AwsAuthentication {
    pub async fn credentials_provider(
        &self,
        service_region: Region,
    ) -> crate::Result<SharedCredentialsProvider> {
        match self {
            Self::AccessKey {
                access_key_id,
                secret_access_key,
                session_token,
            } => Ok(SharedCredentialsProvider::new(Credentials::from_keys(
                access_key_id.inner(),
                secret_access_key.inner(),
                session_token.as_ref().map(|token| token.inner().to_owned()),
            ))),
            Self::Role {
                assume_role,
                imds,
                region,
            } => {
                let auth_region = region.clone().map(Region::new).unwrap_or(service_region);
                let provider = AssumeRoleProvider::builder(assume_role)
                    .region(auth_region)
                    .session_name(ASSUME_ROLE_SESSION_NAME)
                    .build_from_provider(default_credentials_provider(*imds))
                    .await;

                Ok(SharedCredentialsProvider::new(provider))
            }
            Self::Default { imds } => Ok(default_credentials_provider(*imds)),
        }
    }

    #[cfg(test)]
    pub fn test_auth() -> AwsAuthentication {
        AwsAuthentication::AccessKey {
            access_key_id: "dummy".into(),
            secret_access_key: "dummy".into(),
            session_token: None,
        }
    }
}

/// Instance role first, then the process environment, then the shared profile files.
fn default_credentials_provider(imds: ImdsAuthentication) -> SharedCredentialsProvider {
    let client = imds::Client::builder()
        .max_attempts(imds.max_attempts)
        .connect_timeout(imds.connect_timeout)
        .read_timeout(imds.read_timeout)
        .build();

    let chain = CredentialsProviderChain::first_try(
        "Ec2InstanceMetadata",
        ImdsCredentialsProvider::builder().imds_client(client).build(),
    )
    .or_else("Environment", EnvironmentVariableCredentialsProvider::new())
    .or_else("Profile", ProfileFileCredentialsProvider::builder().build());

    SharedCredentialsProvider::new(chain)
}
