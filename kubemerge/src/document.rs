use serde::*;
use serde_yaml::{Mapping, Value as YamlValue};

/// Records that live in one of the named kubeconfig collections.
pub trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

// region: Context
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContextSpec {
    #[serde(default)]
    pub cluster: String,
    #[serde(rename = "user", default)]
    pub auth_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<YamlValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextSpec,
}

impl Named for NamedContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
// endregion

// region: Cluster
/// A cluster entry. The connection data (server, trust material, ...) is kept
/// verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: YamlValue,
}

impl Named for NamedCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
// endregion

// region: User
/// An auth-info entry, stored under `users` in the file. Certificates, tokens
/// and exec plugins are kept verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NamedAuthInfo {
    pub name: String,
    pub user: YamlValue,
}

impl Named for NamedAuthInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
// endregion

// region: Common
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "v1")]
    V1,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Kind {
    #[default]
    Config,
}

/// kubectl writes `clusters: null` and friends for an emptied kubeconfig.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_preferences() -> YamlValue {
    YamlValue::Mapping(Mapping::new())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion", default)]
    pub api_version: ApiVersion,
    #[serde(default)]
    pub kind: Kind,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clusters: Vec<NamedCluster>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contexts: Vec<NamedContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(default = "empty_preferences")]
    pub preferences: YamlValue,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: Vec<NamedAuthInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<YamlValue>,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl KubeConfig {
    /// The skeleton used when there is no destination file yet.
    pub fn empty() -> Self {
        KubeConfig {
            api_version: ApiVersion::V1,
            kind: Kind::Config,
            clusters: Vec::new(),
            contexts: Vec::new(),
            current_context: None,
            preferences: empty_preferences(),
            users: Vec::new(),
            extensions: None,
        }
    }

    pub fn find_context(&self, name: &str) -> Option<&NamedContext> {
        self.contexts.iter().find(|ctx| ctx.name == name)
    }

    pub fn find_cluster(&self, name: &str) -> Option<&NamedCluster> {
        self.clusters.iter().find(|cls| cls.name == name)
    }

    pub fn find_auth_info(&self, name: &str) -> Option<&NamedAuthInfo> {
        self.users.iter().find(|usr| usr.name == name)
    }

    /// Decodes a kubeconfig. Blank input and a bare `null` document are
    /// reported as `None` rather than an error.
    pub fn from_yaml(input: &str) -> Result<Option<KubeConfig>, serde_yaml::Error> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        serde_yaml::from_str(input)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
// endregion

#[cfg(test)]
mod tests {
    use super::*;

    const KUBEADM: &str = "\
apiVersion: v1
kind: Config
clusters:
- cluster:
    certificate-authority-data: Rm9v
    server: https://foo.bar:6443
  name: kubernetes
contexts:
- context:
    cluster: kubernetes
    user: kubernetes-admin
  name: kubernetes-admin@kubernetes
current-context: kubernetes-admin@kubernetes
preferences: {}
users:
- name: kubernetes-admin
  user:
    client-certificate-data: QmFy
    client-key-data: Rm9vYmFy
";

    #[test]
    fn decodes_kubeadm_config() {
        let kc = KubeConfig::from_yaml(KUBEADM).unwrap().unwrap();

        assert_eq!(kc.api_version, ApiVersion::V1);
        assert_eq!(kc.kind, Kind::Config);
        assert_eq!(
            kc.current_context.as_deref(),
            Some("kubernetes-admin@kubernetes")
        );

        let ctx = kc.find_context("kubernetes-admin@kubernetes").unwrap();
        assert_eq!(ctx.context.cluster, "kubernetes");
        assert_eq!(ctx.context.auth_info, "kubernetes-admin");
        assert_eq!(ctx.context.namespace, None);

        let cluster = kc.find_cluster("kubernetes").unwrap();
        assert_eq!(cluster.cluster["server"].as_str(), Some("https://foo.bar:6443"));

        let user = kc.find_auth_info("kubernetes-admin").unwrap();
        assert_eq!(user.user["client-key-data"].as_str(), Some("Rm9vYmFy"));
    }

    #[test]
    fn lookups_miss_on_unknown_names() {
        let kc = KubeConfig::from_yaml(KUBEADM).unwrap().unwrap();

        assert!(kc.find_context("kubernetes").is_none());
        assert!(kc.find_cluster("kubernetes-admin").is_none());
        assert!(kc.find_auth_info("").is_none());
    }

    #[test]
    fn lookup_takes_first_duplicate() {
        let kc = KubeConfig::from_yaml(
            "clusters:\n- name: a\n  cluster: {server: one}\n- name: a\n  cluster: {server: two}\n",
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            kc.find_cluster("a").unwrap().cluster["server"].as_str(),
            Some("one")
        );
    }

    #[test]
    fn blank_and_null_documents_are_absent() {
        assert_eq!(KubeConfig::from_yaml("").unwrap(), None);
        assert_eq!(KubeConfig::from_yaml("  \n\n").unwrap(), None);
        assert_eq!(KubeConfig::from_yaml("null\n").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        assert!(KubeConfig::from_yaml("apiVersion: v1\nkind: Config\nbogus: 1\n").is_err());
    }

    #[test]
    fn rejects_other_kinds() {
        assert!(KubeConfig::from_yaml("apiVersion: v1\nkind: Pod\n").is_err());
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let kc = KubeConfig::from_yaml("current-context: foo\n")
            .unwrap()
            .unwrap();

        assert_eq!(kc.api_version, ApiVersion::V1);
        assert!(kc.contexts.is_empty());
        assert!(kc.clusters.is_empty());
        assert!(kc.users.is_empty());
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let kc = KubeConfig::from_yaml(
            "current-context: null\nclusters: null\ncontexts: null\nusers: null\n",
        )
        .unwrap()
        .unwrap();

        assert!(kc.clusters.is_empty());
        assert!(kc.contexts.is_empty());
        assert!(kc.users.is_empty());
        assert_eq!(kc.current_context, None);
    }

    #[test]
    fn context_without_cluster_or_user_decodes() {
        let kc = KubeConfig::from_yaml("contexts:\n- name: a\n  context:\n    cluster: c\n- name: b\n  context:\n    user: u\n")
            .unwrap()
            .unwrap();

        let a = &kc.find_context("a").unwrap().context;
        assert_eq!((a.cluster.as_str(), a.auth_info.as_str()), ("c", ""));
        let b = &kc.find_context("b").unwrap().context;
        assert_eq!((b.cluster.as_str(), b.auth_info.as_str()), ("", "u"));
    }

    #[test]
    fn empty_skeleton_encodes_schema_identifiers() {
        let yaml = KubeConfig::empty().to_yaml().unwrap();

        assert!(yaml.contains("apiVersion: v1"));
        assert!(yaml.contains("kind: Config"));
        assert!(!yaml.contains("current-context"));
        assert_eq!(KubeConfig::from_yaml(&yaml).unwrap(), Some(KubeConfig::empty()));
    }

    #[test]
    fn opaque_data_survives_reencoding() {
        let input = "\
users:
- name: eks
  user:
    exec:
      apiVersion: client.authentication.k8s.io/v1beta1
      command: aws
      args: [eks, get-token]
";
        let kc = KubeConfig::from_yaml(input).unwrap().unwrap();
        let again = KubeConfig::from_yaml(&kc.to_yaml().unwrap())
            .unwrap()
            .unwrap();

        assert_eq!(kc, again);
        assert_eq!(again.users[0].user["exec"]["command"].as_str(), Some("aws"));
    }
}
