//! Azure Blob Storage client.
//!
//! Uploads go through the Put Blob REST operation, authorized either with
//! the account's Shared Key or with a SAS token taken from the connection
//! string. Put Blob replaces an existing blob with the same name.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use sha2::Sha256;
use tracing::{error, info};
use url::Url;

use super::{BlobStore, StorageError};
use crate::util::build_http_client;

type HmacSha256 = Hmac<Sha256>;

/// REST API version sent with every request.
pub const STORAGE_API_VERSION: &str = "2021-08-06";

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// How requests are authorized.
#[derive(Clone)]
enum Credential {
    /// Decoded account key.
    SharedKey(Vec<u8>),
    /// SAS query string, without the leading `?`.
    Sas(String),
}

/// Storage account details parsed from a connection string.
#[derive(Clone)]
pub struct StorageAccount {
    account_name: Option<String>,
    blob_endpoint: Url,
    credential: Credential,
}

impl StorageAccount {
    /// Parse an Azure Storage connection string.
    pub fn from_connection_string(raw: &str) -> Result<Self, StorageError> {
        let fields: HashMap<String, String> = raw
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                part.split_once('=')
                    .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            })
            .collect();

        if fields
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self {
                account_name: Some(DEV_ACCOUNT_NAME.to_string()),
                blob_endpoint: Url::parse(DEV_BLOB_ENDPOINT)?,
                credential: Credential::SharedKey(decode_key(DEV_ACCOUNT_KEY)?),
            });
        }

        let account_name = fields.get("accountname").cloned();

        let blob_endpoint = match (fields.get("blobendpoint"), &account_name) {
            (Some(endpoint), _) => Url::parse(endpoint)?,
            (None, Some(name)) => {
                let protocol = fields
                    .get("defaultendpointsprotocol")
                    .map(String::as_str)
                    .unwrap_or("https");
                let suffix = fields
                    .get("endpointsuffix")
                    .map(String::as_str)
                    .unwrap_or("core.windows.net");
                Url::parse(&format!("{protocol}://{name}.blob.{suffix}"))?
            }
            (None, None) => {
                return Err(StorageError::InvalidConnectionString(
                    "either BlobEndpoint or AccountName is required".to_string(),
                ))
            }
        };

        let credential = match (fields.get("accountkey"), fields.get("sharedaccesssignature")) {
            (Some(key), _) => {
                if account_name.is_none() {
                    return Err(StorageError::InvalidConnectionString(
                        "AccountKey requires AccountName".to_string(),
                    ));
                }
                Credential::SharedKey(decode_key(key)?)
            }
            (None, Some(sas)) => Credential::Sas(sas.trim_start_matches('?').to_string()),
            (None, None) => {
                return Err(StorageError::InvalidConnectionString(
                    "either AccountKey or SharedAccessSignature is required".to_string(),
                ))
            }
        };

        Ok(Self {
            account_name,
            blob_endpoint,
            credential,
        })
    }

    /// Blob endpoint of the account.
    pub fn blob_endpoint(&self) -> &Url {
        &self.blob_endpoint
    }

    /// Address of `blob` in `container`, including the SAS token if any.
    pub fn blob_url(&self, container: &str, blob: &str) -> Result<Url, StorageError> {
        let base = self.blob_endpoint.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{container}/{blob}"))?;
        if let Credential::Sas(sas) = &self.credential {
            url.set_query(Some(sas));
        }
        Ok(url)
    }
}

fn decode_key(key: &str) -> Result<Vec<u8>, StorageError> {
    STANDARD
        .decode(key)
        .map_err(|e| StorageError::InvalidConnectionString(format!("AccountKey is not base64: {e}")))
}

/// Build the Shared Key string-to-sign for a request without conditional
/// or range headers.
fn string_to_sign(
    verb: &str,
    content_length: usize,
    content_type: &str,
    ms_headers: &[(&str, &str)],
    canonical_resource: &str,
) -> String {
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut headers: Vec<(String, &str)> = ms_headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .collect();
    headers.sort();

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    // Content-Encoding, Content-Language, Content-MD5, Date and the
    // conditional headers are never sent and sign as empty lines.
    format!(
        "{verb}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
    )
}

fn shared_key_signature(key: &[u8], string_to_sign: &str) -> Result<String, StorageError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| StorageError::InvalidConnectionString(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// [`BlobStore`] writing block blobs into one container.
#[derive(Clone)]
pub struct AzureBlobStore {
    client: Client,
    account: StorageAccount,
    container: String,
}

impl AzureBlobStore {
    /// Create a store from a connection string and container name.
    pub fn from_connection_string(
        connection_string: &str,
        container: &str,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let account = StorageAccount::from_connection_string(connection_string)?;
        Ok(Self::new(build_http_client(timeout)?, account, container))
    }

    pub fn new(client: Client, account: StorageAccount, container: &str) -> Self {
        Self {
            client,
            account,
            container: container.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.account.blob_url(&self.container, key)?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let ms_headers = [
            ("x-ms-blob-type", "BlockBlob"),
            ("x-ms-date", date.as_str()),
            ("x-ms-version", STORAGE_API_VERSION),
        ];

        let mut request = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, content_type);
        for (name, value) in ms_headers {
            request = request.header(name, value);
        }

        if let (Credential::SharedKey(account_key), Some(account_name)) =
            (&self.account.credential, &self.account.account_name)
        {
            let resource = format!("/{}{}", account_name, url.path());
            let to_sign = string_to_sign("PUT", body.len(), content_type, &ms_headers, &resource);
            let signature = shared_key_signature(account_key, &to_sign)?;
            request = request.header(
                "Authorization",
                format!("SharedKey {account_name}:{signature}"),
            );
        }

        let body_length = body.len();
        let response = request.body(body).send().await.map_err(|e| {
            error!(container = %self.container, key = %key, error = %e, "blob_put_request_error");
            StorageError::Request(e)
        })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            error!(
                container = %self.container,
                key = %key,
                status_code = status.as_u16(),
                "blob_put_rejected"
            );
            return Err(StorageError::Status {
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        info!(
            container = %self.container,
            key = %key,
            body_length = body_length,
            "blob_put_complete"
        );

        Ok(())
    }
}
