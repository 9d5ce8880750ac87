// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Display-ready views of benchmark runs.
//!
//! [`ConfigurationInfo`] is what the comparison engine consumes: a flattened
//! summary of one run configuration with the host ([`SystemInfo`]) and the
//! container engine ([`EngineInfo`]) it ran on.

use crate::metrics::UsageAverages;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use topsail_core::Settings;

/// Placeholder for values that are not available.
pub const NOT_AVAILABLE: &str = "N/A";

/// Host properties tracked across configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SystemField {
    /// Hardware model identifier
    ModelId,
    /// CPU model / chip
    CpuModel,
    /// Number of cores
    CpuCores,
    /// CPU architecture
    Architecture,
    /// Installed memory
    Memory,
    /// Operating system version
    OsVersion,
    /// Kernel version
    KernelVersion,
}

impl SystemField {
    /// All fields, in display order.
    pub const ALL: [SystemField; 7] = [
        Self::ModelId,
        Self::CpuModel,
        Self::CpuCores,
        Self::Architecture,
        Self::Memory,
        Self::OsVersion,
        Self::KernelVersion,
    ];

    /// Field key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ModelId => "Model_id",
            Self::CpuModel => "CPU_model",
            Self::CpuCores => "CPU_cores",
            Self::Architecture => "Architecture",
            Self::Memory => "Memory",
            Self::OsVersion => "OS_version",
            Self::KernelVersion => "Kernel_version",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ModelId => "Model ID",
            Self::CpuModel => "CPU Model",
            Self::CpuCores => "CPU Cores",
            Self::Architecture => "Architecture",
            Self::Memory => "Memory",
            Self::OsVersion => "OS Version",
            Self::KernelVersion => "Kernel Version",
        }
    }
}

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    /// Linux host
    Linux,
    /// Windows host
    Windows,
    /// macOS host
    MacOs,
    /// Anything else
    Unknown,
}

impl SystemKind {
    /// Detect the family from an OS version string.
    pub fn detect(os_version: &str) -> Self {
        let os = os_version.to_lowercase();
        if os.contains("linux") {
            Self::Linux
        } else if os.contains("windows") {
            Self::Windows
        } else if os.contains("mac") || os.contains("darwin") {
            Self::MacOs
        } else {
            Self::Unknown
        }
    }
}

/// Host description extracted from the system state artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system version.
    pub os_version: String,
    /// Kernel version.
    pub kernel_version: String,
    /// CPU model.
    pub cpu_model: String,
    /// Number of cores.
    pub cpu_cores: String,
    /// Installed memory.
    pub memory: String,
    /// Hardware model identifier.
    pub model_id: String,
    /// CPU architecture.
    pub architecture: String,
}

impl SystemInfo {
    /// Value of one field.
    pub fn get(&self, field: SystemField) -> &str {
        match field {
            SystemField::ModelId => &self.model_id,
            SystemField::CpuModel => &self.cpu_model,
            SystemField::CpuCores => &self.cpu_cores,
            SystemField::Architecture => &self.architecture,
            SystemField::Memory => &self.memory,
            SystemField::OsVersion => &self.os_version,
            SystemField::KernelVersion => &self.kernel_version,
        }
    }

    /// Operating system family of the host.
    pub fn kind(&self) -> SystemKind {
        SystemKind::detect(&self.os_version)
    }
}

/// Supported container engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePlatform {
    /// Podman
    Podman,
    /// Docker
    Docker,
}

impl EnginePlatform {
    /// Parse the `container_engine` setting. Unknown engines yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "podman" => Some(Self::Podman),
            "docker" => Some(Self::Docker),
            _ => None,
        }
    }

    /// Setting value of this engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Podman => "podman",
            Self::Docker => "docker",
        }
    }
}

/// Container engine properties tracked across configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EngineField {
    /// Client version (non-Linux hosts only)
    ClientVersion,
    /// Engine (server) version
    HostVersion,
    /// Rootless mode (podman only)
    Mode,
    /// OCI runtime
    Runtime,
    /// CPUs visible to the engine
    HostCpu,
    /// Memory visible to the engine
    HostMemory,
    /// Kernel of the engine host
    HostKernel,
}

impl EngineField {
    /// All fields, in display order.
    pub const ALL: [EngineField; 7] = [
        Self::ClientVersion,
        Self::HostVersion,
        Self::Mode,
        Self::Runtime,
        Self::HostCpu,
        Self::HostMemory,
        Self::HostKernel,
    ];

    /// Field key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ClientVersion => "Client_version",
            Self::HostVersion => "Host_version",
            Self::Mode => "Mode",
            Self::Runtime => "Runtime",
            Self::HostCpu => "Host_cpu",
            Self::HostMemory => "Host_memory",
            Self::HostKernel => "Host_kernel",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ClientVersion => "Client Version",
            Self::HostVersion => "Host Version",
            Self::Mode => "Rootless Mode",
            Self::Runtime => "Runtime",
            Self::HostCpu => "Host CPU",
            Self::HostMemory => "Host Memory",
            Self::HostKernel => "Host Kernel",
        }
    }

    /// Short name used in configuration labels.
    pub fn label_name(&self) -> &'static str {
        match self {
            Self::ClientVersion => "Client",
            Self::HostVersion => "Host",
            Self::Mode => "Rootless",
            Self::Runtime => "Runtime",
            Self::HostCpu => "CPU",
            Self::HostMemory => "Memory",
            Self::HostKernel => "Kernel",
        }
    }
}

/// Container engine description extracted from `podman info` / `docker info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Which engine this is.
    pub platform: EnginePlatform,
    /// Client version, only extracted on non-Linux hosts.
    pub client_version: Option<String>,
    /// Engine version.
    pub host_version: String,
    /// Rootless mode, podman only.
    pub mode: Option<String>,
    /// OCI runtime.
    pub runtime: String,
    /// CPUs.
    pub host_cpu: String,
    /// Memory, in bytes as reported by the engine.
    pub host_memory: String,
    /// Kernel.
    pub host_kernel: String,
}

impl EngineInfo {
    /// Value of one field, `None` when the engine does not report it.
    pub fn get(&self, field: EngineField) -> Option<&str> {
        match field {
            EngineField::ClientVersion => self.client_version.as_deref(),
            EngineField::HostVersion => Some(&self.host_version),
            EngineField::Mode => self.mode.as_deref(),
            EngineField::Runtime => Some(&self.runtime),
            EngineField::HostCpu => Some(&self.host_cpu),
            EngineField::HostMemory => Some(&self.host_memory),
            EngineField::HostKernel => Some(&self.host_kernel),
        }
    }
}

/// Flattened, display-ready summary of one run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationInfo {
    /// Row label.
    pub config_label: String,
    /// Settings the configuration was selected with.
    pub settings: Settings,
    /// 95th percentile execution time, in seconds.
    pub exec_time: Option<f64>,
    /// Execution time jitter, in seconds.
    pub jitter: Option<f64>,
    /// Number of benchmark repetitions.
    pub runs: u64,
    /// Benchmark command line.
    pub command: Option<String>,
    /// When the benchmark ran.
    pub timestamp: Option<String>,
    /// Machine provider backing the engine (`applehv`, `wsl`, ...).
    pub container_engine_provider: Option<String>,
    /// Host description.
    pub system: Option<SystemInfo>,
    /// Engine description.
    pub container_engine_info: Option<EngineInfo>,
    /// Raw engine info, for technical details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_engine_full: Option<Value>,
    /// Average resource usage per metric; absent metrics have no key.
    pub usage: UsageAverages,
}

impl ConfigurationInfo {
    /// The `container_engine` setting.
    pub fn container_engine(&self) -> Option<&str> {
        self.settings.get_str("container_engine")
    }

    /// Execution time when it is a usable positive measurement.
    pub fn positive_exec_time(&self) -> Option<f64> {
        self.exec_time.filter(|t| *t > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_kind_detection() {
        assert_eq!(SystemKind::detect("Fedora Linux 40"), SystemKind::Linux);
        assert_eq!(SystemKind::detect("Microsoft Windows 11 Pro"), SystemKind::Windows);
        assert_eq!(SystemKind::detect("macOS 14.5 (23F79)"), SystemKind::MacOs);
        assert_eq!(SystemKind::detect("Darwin 23.5"), SystemKind::MacOs);
        assert_eq!(SystemKind::detect(""), SystemKind::Unknown);
    }

    #[test]
    fn test_engine_platform_parse() {
        assert_eq!(EnginePlatform::parse("podman"), Some(EnginePlatform::Podman));
        assert_eq!(EnginePlatform::parse("docker"), Some(EnginePlatform::Docker));
        assert_eq!(EnginePlatform::parse("containerd"), None);
    }

    #[test]
    fn test_engine_field_access() {
        let info = EngineInfo {
            platform: EnginePlatform::Docker,
            client_version: None,
            host_version: "27.0".into(),
            mode: None,
            runtime: "runc".into(),
            host_cpu: "8".into(),
            host_memory: "8589934592".into(),
            host_kernel: "6.10".into(),
        };
        assert_eq!(info.get(EngineField::HostVersion), Some("27.0"));
        assert_eq!(info.get(EngineField::Mode), None);
        assert_eq!(info.get(EngineField::ClientVersion), None);
    }
}
