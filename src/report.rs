use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

pub const REPORT_NAMES: [&str; 4] = [
    "advertise_new_routes",
    "advertise_strong_routes",
    "withdraw_strong_routes",
    "withdraw_last_routes",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteSample {
    pub time: String,
    pub advertised: i64,
    pub received: i64,
}

#[derive(Clone, Debug)]
pub struct ReportFile {
    pub name: &'static str,
    pub raw: String,
    pub samples: Vec<RouteSample>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportStats {
    pub name: &'static str,
    pub samples: usize,
    pub first_time: Option<String>,
    pub last_time: Option<String>,
    pub peak_advertised: i64,
    pub peak_received: i64,
    pub final_advertised: i64,
    pub final_received: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub reports: Vec<ReportStats>,
    pub total_samples: usize,
}

pub fn load_reports(dir: &Path) -> anyhow::Result<Vec<ReportFile>> {
    REPORT_NAMES.into_iter().map(|name| load_report(dir, name)).collect()
}

fn load_report(dir: &Path, name: &'static str) -> anyhow::Result<ReportFile> {
    let path = dir.join(format!("{}.json", name));
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading report data {}", path.display()))?
        .trim()
        .to_string();
    // Parsed records feed the summary only; the page embeds `raw` verbatim.
    let samples = match serde_json::from_str::<Vec<RouteSample>>(&raw) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("{}: not a record array ({}), summary will be empty", path.display(), e);
            vec![]
        }
    };
    Ok(ReportFile { name, raw, samples })
}

pub fn parse_sample_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

pub fn build_summary(reports: &[ReportFile]) -> RunSummary {
    let mut out = Vec::with_capacity(reports.len());
    let mut total_samples = 0usize;
    for r in reports {
        let mut first: Option<(NaiveTime, &str)> = None;
        let mut last: Option<(NaiveTime, &str)> = None;
        for s in &r.samples {
            let Some(t) = parse_sample_time(&s.time) else {
                log::debug!("{}: skipping malformed time {:?}", r.name, s.time);
                continue;
            };
            if first.as_ref().is_none_or(|(f, _)| t < *f) { first = Some((t, s.time.as_str())); }
            if last.as_ref().is_none_or(|(l, _)| t > *l) { last = Some((t, s.time.as_str())); }
        }
        total_samples += r.samples.len();
        out.push(ReportStats {
            name: r.name,
            samples: r.samples.len(),
            first_time: first.map(|(_, s)| s.to_string()),
            last_time: last.map(|(_, s)| s.to_string()),
            peak_advertised: r.samples.iter().map(|s| s.advertised).max().unwrap_or(0),
            peak_received: r.samples.iter().map(|s| s.received).max().unwrap_or(0),
            final_advertised: r.samples.last().map(|s| s.advertised).unwrap_or(0),
            final_received: r.samples.last().map(|s| s.received).unwrap_or(0),
        });
    }
    RunSummary { reports: out, total_samples }
}

pub fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("routechart.out");
    let tmp: PathBuf = dir.join(format!(".{}.tmp", stem));
    std::fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("replacing {}", path.display()));
    }
    Ok(())
}

pub fn write_csv(path: &str, reports: &[ReportFile]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("writing {}", path))?;
    wtr.write_record(["report", "time", "advertised", "received"])?;
    for r in reports {
        for s in &r.samples {
            wtr.write_record([r.name.to_string(), s.time.clone(), s.advertised.to_string(), s.received.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
