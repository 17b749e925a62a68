//! Service declarations and the runtime view of started instances

use shared::PortSpec;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Mount point of the environment's shared directory inside every container
pub const CONTAINER_SHARED_DIR: &str = "/shared";

/// How to decide that a started service accepts connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessSpec {
    /// An HTTP GET on `path` of the named port answers 2xx
    Http { port: String, path: String },
    /// A TCP connection to the named port succeeds
    Tcp { port: String },
}

impl ReadinessSpec {
    pub fn http(port: &str, path: &str) -> Self {
        Self::Http {
            port: port.to_string(),
            path: path.to_string(),
        }
    }

    pub fn tcp(port: &str) -> Self {
        Self::Tcp {
            port: port.to_string(),
        }
    }

    pub fn port(&self) -> &str {
        match self {
            Self::Http { port, .. } | Self::Tcp { port } => port,
        }
    }
}

/// Declarative definition of one service in an environment.
///
/// The configuration payload is opaque here: collaborators receive it either
/// as arguments or as a file written into the service directory beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub image: String,
    pub entrypoint: Option<String>,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub ports: Vec<PortSpec>,
    pub readiness: Option<ReadinessSpec>,
    /// Port serving `/metrics` in the Prometheus text format
    pub metrics_port: Option<String>,
}

impl ServiceSpec {
    pub fn new<N: Into<String>, I: Into<String>>(name: N, image: I) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            entrypoint: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            ports: Vec::new(),
            readiness: None,
            metrics_port: None,
        }
    }

    pub fn entrypoint<S: Into<String>>(mut self, entrypoint: S) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    pub fn readiness(mut self, readiness: ReadinessSpec) -> Self {
        self.readiness = Some(readiness);
        self
    }

    pub fn metrics_on(mut self, port: &str) -> Self {
        self.metrics_port = Some(port.to_string());
        self
    }

    pub fn find_port(&self, name: &str) -> Option<&PortSpec> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// Everything a launcher needs to start one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub network: String,
    pub hostname: String,
    /// Host directory mounted at [`CONTAINER_SHARED_DIR`]
    pub shared_dir: PathBuf,
    pub spec: ServiceSpec,
}

/// A started service instance as seen by the harness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub container: String,
    /// Port name -> `hostname:port` reachable from other services
    pub internal: HashMap<String, String>,
    /// Port name -> `127.0.0.1:port` reachable from the harness
    pub external: HashMap<String, String>,
    pub readiness: Option<ReadinessSpec>,
    pub metrics_port: Option<String>,
}

impl Instance {
    pub fn internal_endpoint(&self, port: &str) -> Option<&str> {
        self.internal.get(port).map(String::as_str)
    }

    pub fn endpoint(&self, port: &str) -> Option<&str> {
        self.external.get(port).map(String::as_str)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One containerised tool invocation, used as a stage of a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub image: String,
    pub args: Vec<String>,
    /// Host path -> container path
    pub volumes: Vec<(PathBuf, String)>,
}

impl ToolRun {
    pub fn new<S: Into<String>>(image: S) -> Self {
        Self {
            image: image.into(),
            args: Vec::new(),
            volumes: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn volume<P: Into<PathBuf>, S: Into<String>>(mut self, host: P, container: S) -> Self {
        self.volumes.push((host.into(), container.into()));
        self
    }
}

impl fmt::Display for ToolRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.image, self.args.join(" "))
    }
}
