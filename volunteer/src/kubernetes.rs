//! Node inventory from the Kubernetes API, using the pod's service account.

use crate::inventory::{
    NodeLister,
    ServerVersioner,
};
use census_report::{
    node_id,
    non_empty,
    sorted_capacity,
    Node,
};
use eyre::{
    eyre,
    Context as _,
    OptionExt as _,
    Result,
};
use futures::future::BoxFuture;
use reqwest::{
    Certificate,
    Client,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use std::{
    collections::HashMap,
    path::Path,
    time::Duration,
};
use url::Url;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Cloud providers Kubernetes knows about. Anything else is reported as
/// `unknown` so a custom provider ID can't leak through.
const CLOUD_PROVIDERS: &[&str] = &[
    "aws",
    "azure",
    "cloudstack",
    "gce",
    "mesos",
    "openstack",
    "ovirt",
    "photon",
    "rackspace",
    "vsphere",
];

#[derive(Debug, Clone)]
pub struct KubeClient {
    client: Client,
    api: Url,
    token: Option<String>,
}

impl KubeClient {
    pub fn new(api: Url, token: Option<String>, ca_pem: Option<&[u8]>, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(pem) = ca_pem {
            let certificate = Certificate::from_pem(pem).wrap_err("invalid cluster CA certificate")?;
            builder = builder.add_root_certificate(certificate);
        }
        let client = builder.build().wrap_err("failed to build Kubernetes HTTP client")?;
        Ok(Self { client, api, token })
    }

    /// An explicit `api` address (e.g. a `kubectl proxy`) is used as is,
    /// without credentials. Otherwise see [`KubeClient::in_cluster`].
    pub fn connect(api: Option<Url>, timeout: Duration) -> Result<Self> {
        match api {
            Some(api) => {
                debug!(%api, "using Kubernetes API override");
                Self::new(api, None, None, timeout)
            }
            None => Self::in_cluster(timeout),
        }
    }

    /// Connect using the service account mounted into the pod.
    pub fn in_cluster(timeout: Duration) -> Result<Self> {
        let api = in_cluster_api_url()?;
        let dir = Path::new(SERVICE_ACCOUNT_DIR);
        let token = std::fs::read_to_string(dir.join("token"))
            .wrap_err("failed to read service account token")?
            .trim()
            .to_string();
        let ca = std::fs::read(dir.join("ca.crt")).wrap_err("failed to read cluster CA bundle")?;
        debug!(%api, "using in-cluster Kubernetes API");
        Self::new(api, Some(token), Some(&ca), timeout)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.api.join(path)?;
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("GET {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("GET {url} returned {status}"));
        }
        response
            .json()
            .await
            .wrap_err_with(|| format!("failed to decode response from {url}"))
    }
}

fn in_cluster_api_url() -> Result<Url> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST")
        .ok()
        .filter(|h| !h.is_empty())
        .ok_or_eyre("KUBERNETES_SERVICE_HOST is not set; not running in a cluster?")?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
    let host = if host.contains(':') { format!("[{host}]") } else { host };
    Url::parse(&format!("https://{host}:{port}")).wrap_err("invalid in-cluster API address")
}

impl NodeLister for KubeClient {
    fn list_nodes(&self) -> BoxFuture<'_, Result<Vec<Node>>> {
        Box::pin(async move {
            let list: KubeNodeList = self.get("/api/v1/nodes").await?;
            Ok(list.items.iter().map(node_from_kube_node).collect())
        })
    }
}

impl ServerVersioner for KubeClient {
    fn server_version(&self) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let info: KubeVersionInfo = self.get("/version").await?;
            Ok(info.git_version)
        })
    }
}

// Just the parts of the Kubernetes objects we report on.

#[derive(Debug, Default, Deserialize)]
struct KubeNodeList {
    #[serde(default)]
    items: Vec<KubeNode>,
}

#[derive(Debug, Default, Deserialize)]
struct KubeNode {
    #[serde(default)]
    metadata: KubeObjectMeta,
    #[serde(default)]
    spec: KubeNodeSpec,
    #[serde(default)]
    status: KubeNodeStatus,
}

#[derive(Debug, Default, Deserialize)]
struct KubeObjectMeta {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct KubeNodeSpec {
    #[serde(default, rename = "providerID")]
    provider_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubeNodeStatus {
    #[serde(default)]
    capacity: HashMap<String, String>,
    #[serde(default)]
    node_info: KubeNodeSystemInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubeNodeSystemInfo {
    #[serde(default, rename = "machineID")]
    machine_id: String,
    #[serde(default, rename = "systemUUID")]
    system_uuid: String,
    #[serde(default)]
    kernel_version: String,
    #[serde(default)]
    os_image: String,
    #[serde(default)]
    container_runtime_version: String,
    #[serde(default)]
    kubelet_version: String,
    #[serde(default)]
    operating_system: String,
    #[serde(default)]
    architecture: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubeVersionInfo {
    git_version: String,
}

fn node_from_kube_node(kube_node: &KubeNode) -> Node {
    let info = &kube_node.status.node_info;
    Node {
        id: node_id(&kube_node.metadata.name, &info.machine_id, &info.system_uuid),
        operating_system: non_empty(&info.operating_system),
        os_image: non_empty(&info.os_image),
        kernel_version: non_empty(&info.kernel_version),
        architecture: non_empty(&info.architecture),
        container_runtime_version: non_empty(&info.container_runtime_version),
        kubelet_version: non_empty(&info.kubelet_version),
        cloud_provider: non_empty(provider_name(&kube_node.spec.provider_id)),
        capacity: sorted_capacity(kube_node.status.capacity.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
    }
}

/// The `<provider>` part of a `<provider>://<node-id>` provider ID, when it
/// names a known cloud provider.
fn provider_name(provider_id: &str) -> &str {
    match provider_id.split_once("://") {
        Some((provider, rest)) if !rest.contains("://") && CLOUD_PROVIDERS.contains(&provider) => provider,
        _ => "unknown",
    }
}
