use crate::report::RunSummary;

pub fn render_markdown(summary: &RunSummary) -> String {
    let mut s = String::new();
    s.push_str("# Route Convergence Report\n\n");
    s.push_str(&format!("Total Samples: {}\n\n", summary.total_samples));

    s.push_str("## Scenarios\n");
    for r in &summary.reports {
        s.push_str(&format!("- {} ({} samples)\n", r.name, r.samples));
    }
    s.push('\n');

    for r in &summary.reports {
        s.push_str(&format!("## {}\n", r.name));
        if r.samples == 0 {
            s.push_str("No samples\n\n");
            continue;
        }
        match (r.first_time.as_ref(), r.last_time.as_ref()) {
            (Some(f), Some(l)) => s.push_str(&format!("- Window: {} → {}\n", f, l)),
            _ => s.push_str("- Window: unknown\n"),
        }
        s.push_str(&format!("- Peak Advertised: {}\n", r.peak_advertised));
        s.push_str(&format!("- Peak Received: {}\n", r.peak_received));
        s.push_str(&format!(
            "- Final: {} advertised / {} received\n\n",
            r.final_advertised, r.final_received
        ));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportStats;

    #[test]
    fn renders_window_and_peaks() {
        let summary = RunSummary {
            reports: vec![ReportStats {
                name: "advertise_new_routes",
                samples: 2,
                first_time: Some("08:00:00".into()),
                last_time: Some("08:00:10".into()),
                peak_advertised: 120,
                peak_received: 80,
                final_advertised: 100,
                final_received: 80,
            }],
            total_samples: 2,
        };
        let md = render_markdown(&summary);
        assert!(md.starts_with("# Route Convergence Report"));
        assert!(md.contains("## advertise_new_routes"));
        assert!(md.contains("- Window: 08:00:00 → 08:00:10"));
        assert!(md.contains("- Peak Advertised: 120"));
        assert!(md.contains("- Final: 100 advertised / 80 received"));
    }

    #[test]
    fn empty_report_marked() {
        let summary = RunSummary {
            reports: vec![ReportStats {
                name: "withdraw_last_routes",
                samples: 0,
                first_time: None,
                last_time: None,
                peak_advertised: 0,
                peak_received: 0,
                final_advertised: 0,
                final_received: 0,
            }],
            total_samples: 0,
        };
        let md = render_markdown(&summary);
        assert!(md.contains("No samples"));
    }
}
