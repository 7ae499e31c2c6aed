//! 런타임 통계 샘플링.
//!
//! `RuntimeSampler` 포트 구현. sysinfo 기반 메모리/CPU/프로세스/디스크/네트워크 수집.
//! gauge 목록은 (이름, 접근자) 정적 테이블로 고정한다.

use async_trait::async_trait;
use mcollect_core::error::CoreError;
use mcollect_core::models::{MetricRecord, MetricSet};
use mcollect_core::ports::sampler::RuntimeSampler;
use std::sync::Mutex;
use sysinfo::{Disks, Networks, Pid, ProcessesToUpdate, System};
use tracing::debug;

/// 샘플 한 회분의 원시 통계
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeSample {
    pub total_memory: u64,
    pub used_memory: u64,
    pub free_memory: u64,
    pub available_memory: u64,
    pub total_swap: u64,
    pub used_swap: u64,
    pub free_swap: u64,
    /// 전체 CPU 사용률 (%)
    pub cpu_utilization: f32,
    pub cpu_count: usize,
    pub load_average_1: f64,
    pub load_average_5: f64,
    pub load_average_15: f64,
    /// 시스템 가동 시간 (초)
    pub uptime: u64,
    pub process_resident_memory: u64,
    pub process_virtual_memory: u64,
    /// 현재 프로세스 스레드 수 (Linux 외에서는 0)
    pub process_thread_count: usize,
    /// 현재 프로세스 CPU 사용률 (%)
    pub process_cpu_usage: f32,
    /// 직전 갱신 이후 읽은 바이트
    pub process_disk_read: u64,
    /// 직전 갱신 이후 쓴 바이트
    pub process_disk_written: u64,
    pub process_disk_total_read: u64,
    pub process_disk_total_written: u64,
    /// 현재 프로세스 실행 시간 (초)
    pub process_run_time: u64,
    pub process_count: usize,
    pub disk_total_space: u64,
    pub disk_available_space: u64,
    /// 전체 인터페이스 누적 수신 바이트
    pub network_received: u64,
    /// 전체 인터페이스 누적 송신 바이트
    pub network_transmitted: u64,
}

/// gauge 접근자
pub type GaugeAccessor = fn(&RuntimeSample) -> f64;

/// 수집 대상 gauge 테이블 (이름, 접근자)
pub const GAUGE_FIELDS: &[(&str, GaugeAccessor)] = &[
    ("TotalMemory", |s| s.total_memory as f64),
    ("UsedMemory", |s| s.used_memory as f64),
    ("FreeMemory", |s| s.free_memory as f64),
    ("AvailableMemory", |s| s.available_memory as f64),
    ("TotalSwap", |s| s.total_swap as f64),
    ("UsedSwap", |s| s.used_swap as f64),
    ("FreeSwap", |s| s.free_swap as f64),
    ("CPUutilization", |s| s.cpu_utilization as f64),
    ("CPUCount", |s| s.cpu_count as f64),
    ("LoadAverage1", |s| s.load_average_1),
    ("LoadAverage5", |s| s.load_average_5),
    ("LoadAverage15", |s| s.load_average_15),
    ("Uptime", |s| s.uptime as f64),
    ("ProcessResidentMemory", |s| s.process_resident_memory as f64),
    ("ProcessVirtualMemory", |s| s.process_virtual_memory as f64),
    ("ProcessThreadCount", |s| s.process_thread_count as f64),
    ("ProcessCPUUsage", |s| s.process_cpu_usage as f64),
    ("ProcessDiskRead", |s| s.process_disk_read as f64),
    ("ProcessDiskWritten", |s| s.process_disk_written as f64),
    ("ProcessDiskTotalRead", |s| s.process_disk_total_read as f64),
    ("ProcessDiskTotalWritten", |s| s.process_disk_total_written as f64),
    ("ProcessRunTime", |s| s.process_run_time as f64),
    ("ProcessCount", |s| s.process_count as f64),
    ("DiskTotalSpace", |s| s.disk_total_space as f64),
    ("DiskAvailableSpace", |s| s.disk_available_space as f64),
    ("NetworkReceived", |s| s.network_received as f64),
    ("NetworkTransmitted", |s| s.network_transmitted as f64),
];

impl RuntimeSample {
    /// 테이블 순서대로 gauge 레코드 집합 생성
    ///
    /// 유한하지 않은 값은 0으로 대체한다.
    pub fn to_metric_set(&self) -> MetricSet {
        GAUGE_FIELDS
            .iter()
            .map(|(name, accessor)| {
                let value = accessor(self);
                let value = if value.is_finite() { value } else { 0.0 };
                (name.to_string(), MetricRecord::gauge(*name, value))
            })
            .collect()
    }
}

/// sysinfo 기반 샘플러: `RuntimeSampler` 포트 구현
pub struct SysInfoSampler {
    sys: Mutex<System>,
    pid: Option<Pid>,
}

impl SysInfoSampler {
    /// 새 샘플러 생성
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            debug!("현재 PID 조회 실패, 프로세스 gauge는 0으로 보고");
        }
        Self {
            sys: Mutex::new(System::new_all()),
            pid,
        }
    }

    /// 즉시 샘플링
    pub fn sample_now(&self) -> Result<RuntimeSample, CoreError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| CoreError::Internal(format!("시스템 잠금 실패: {e}")))?;
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let load = System::load_average();
        let mut sample = RuntimeSample {
            total_memory: sys.total_memory(),
            used_memory: sys.used_memory(),
            free_memory: sys.free_memory(),
            available_memory: sys.available_memory(),
            total_swap: sys.total_swap(),
            used_swap: sys.used_swap(),
            free_swap: sys.free_swap(),
            cpu_utilization: sys.global_cpu_usage(),
            cpu_count: sys.cpus().len(),
            load_average_1: load.one,
            load_average_5: load.five,
            load_average_15: load.fifteen,
            uptime: System::uptime(),
            process_count: sys.processes().len(),
            ..RuntimeSample::default()
        };

        if let Some(process) = self.pid.and_then(|pid| sys.process(pid)) {
            let disk = process.disk_usage();
            sample.process_resident_memory = process.memory();
            sample.process_virtual_memory = process.virtual_memory();
            sample.process_thread_count = process.tasks().map_or(0, |tasks| tasks.len());
            sample.process_cpu_usage = process.cpu_usage();
            sample.process_disk_read = disk.read_bytes;
            sample.process_disk_written = disk.written_bytes;
            sample.process_disk_total_read = disk.total_read_bytes;
            sample.process_disk_total_written = disk.total_written_bytes;
            sample.process_run_time = process.run_time();
        }
        drop(sys);

        // 디스크 합계
        let disks = Disks::new_with_refreshed_list();
        let (total, available) = disks.list().iter().fold((0u64, 0u64), |(t, a), d| {
            (
                t.saturating_add(d.total_space()),
                a.saturating_add(d.available_space()),
            )
        });
        sample.disk_total_space = total;
        sample.disk_available_space = available;

        // 네트워크 합계
        let networks = Networks::new_with_refreshed_list();
        let (received, transmitted) =
            networks
                .list()
                .iter()
                .fold((0u64, 0u64), |(rx, tx), (_name, data)| {
                    (
                        rx.saturating_add(data.total_received()),
                        tx.saturating_add(data.total_transmitted()),
                    )
                });
        sample.network_received = received;
        sample.network_transmitted = transmitted;

        Ok(sample)
    }
}

impl Default for SysInfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeSampler for SysInfoSampler {
    async fn sample(&self) -> Result<MetricSet, CoreError> {
        let sample = self.sample_now()?;
        debug!(
            "런타임 샘플: CPU {:.1}%, 메모리 {}/{} bytes, 프로세스 {}개",
            sample.cpu_utilization, sample.used_memory, sample.total_memory, sample.process_count
        );
        Ok(sample.to_metric_set())
    }
}
