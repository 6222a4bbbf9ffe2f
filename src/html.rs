use anyhow::bail;

use crate::Theme;
use crate::report::ReportFile;

pub const PLACEHOLDER: &str = "__DATA__";

const PAGE_HEAD: &str = "<html>\n  <head>\n    <meta charset=\"utf-8\">\n    <title>Route Convergence Report</title>\n    <style>";

const STYLE_DARK: &str = "body{margin:0;padding:24px;background:#0f1216;color:#e5e7eb;font-family:Segoe UI,system-ui,Arial,sans-serif} h2{font-weight:600}";
const STYLE_LIGHT: &str = "body{margin:0;padding:24px;background:#f7fafc;color:#111827;font-family:Segoe UI,system-ui,Arial,sans-serif} h2{font-weight:600}";

const PAGE_BODY: &str = r#"</style>
  </head>
  <body>
    <h2>Test Case 1: Advertise New Prefixes via Peer 1</h2>
    <div id="advertise_new_routes" style="width: 900px; height: 500px"></div>

    <h2>Test Case 2: Advertise Stronger Prefixes via Peer 2</h2>
    <div id="advertise_strong_routes" style="width: 900px; height: 500px"></div>

    <h2>Test Case 3: Withdraw the Stronger Prefixes via Peer 2</h2>
    <div id="withdraw_strong_routes" style="width: 900px; height: 500px"></div>

    <h2>Test Case 4: Withdraw the Rest of Prefixes via Peer 1</h2>
    <div id="withdraw_last_routes" style="width: 900px; height: 500px"></div>

    <script type="text/javascript" src="https://www.gstatic.com/charts/loader.js"></script>
    <script type="text/javascript">
     google.charts.load('current', {packages: ['corechart', 'line']});
     google.charts.setOnLoadCallback(function () {
       draw('advertise_new_routes', 'Advertised Prefixes', 'Received Prefixes');
       draw('advertise_strong_routes', 'Advertised Prefixes', 'Received Prefixes');
       draw('withdraw_strong_routes', 'Advertised Withdrawn Prefixes', 'Received Withdrawn Prefixes');
       draw('withdraw_last_routes', 'Advertised Withdrawn Prefixes', 'Received Withdrawn Prefixes');
     });

     var data = {};
__DATA__
     function timeOfDay(stamp) {
       return stamp.split(':').map(function (part) { return parseInt(part, 10); });
     }

     function draw(name, advertisedLabel, receivedLabel) {
       var table = new google.visualization.DataTable();
       table.addColumn('timeofday', 'Time');
       table.addColumn('number', advertisedLabel);
       table.addColumn('number', receivedLabel);
       table.addRows(data[name].map(function (row) {
         return [timeOfDay(row.time), row.advertised, row.received];
       }));

       var chart = new google.visualization.LineChart(document.getElementById(name));
       chart.draw(table, {hAxis: {title: 'Time'}, vAxis: {title: 'Prefixes'}});
     }
    </script>
  </body>
</html>
"#;

pub fn builtin_template(theme: Theme) -> String {
    let style = match theme {
        Theme::Dark => STYLE_DARK,
        Theme::Light => STYLE_LIGHT,
    };
    format!("{}{}{}", PAGE_HEAD, style, PAGE_BODY)
}

pub fn data_block(reports: &[ReportFile]) -> String {
    let mut block = String::new();
    for r in reports {
        block.push_str(&format!("  data['{}'] = {};\n", r.name, r.raw));
    }
    block
}

pub fn render_page(template: &str, reports: &[ReportFile]) -> anyhow::Result<String> {
    let occurrences = template.matches(PLACEHOLDER).count();
    if occurrences != 1 {
        bail!(
            "template must contain the {} marker exactly once (found {})",
            PLACEHOLDER,
            occurrences
        );
    }
    Ok(template.replacen(PLACEHOLDER, &data_block(reports), 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{REPORT_NAMES, RouteSample};

    fn sample_reports() -> Vec<ReportFile> {
        REPORT_NAMES
            .into_iter()
            .enumerate()
            .map(|(i, name)| ReportFile {
                name,
                raw: format!("[{{\"time\":\"08:0{}\",\"advertised\":{},\"received\":0}}]", i, i + 1),
                samples: vec![],
            })
            .collect()
    }

    #[test]
    fn builtin_template_has_one_marker_and_all_chart_divs() {
        for theme in [Theme::Dark, Theme::Light] {
            let t = builtin_template(theme);
            assert_eq!(t.matches(PLACEHOLDER).count(), 1);
            for name in REPORT_NAMES {
                assert!(t.contains(&format!("id=\"{}\"", name)));
            }
        }
    }

    #[test]
    fn data_block_embeds_trimmed_content_verbatim() {
        let reports = sample_reports();
        let block = data_block(&reports);
        for r in &reports {
            assert!(block.contains(&format!("  data['{}'] = {};\n", r.name, r.raw)));
        }
    }

    #[test]
    fn render_removes_marker() {
        let page = render_page(&builtin_template(Theme::Dark), &sample_reports()).unwrap();
        assert!(!page.contains(PLACEHOLDER));
    }

    #[test]
    fn render_is_deterministic() {
        let reports = sample_reports();
        let t = builtin_template(Theme::Dark);
        assert_eq!(render_page(&t, &reports).unwrap(), render_page(&t, &reports).unwrap());
    }

    #[test]
    fn embedded_records_round_trip() {
        let reports = vec![ReportFile {
            name: "advertise_new_routes",
            raw: "[{\"time\":\"08:00\",\"advertised\":1,\"received\":0}]".to_string(),
            samples: vec![],
        }];
        let page = render_page(&builtin_template(Theme::Dark), &reports).unwrap();
        let line = page
            .lines()
            .find(|l| l.trim_start().starts_with("data['advertise_new_routes']"))
            .unwrap();
        let json = line
            .split_once('=')
            .unwrap()
            .1
            .trim()
            .trim_end_matches(';');
        let parsed: Vec<RouteSample> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].time, "08:00");
        assert_eq!(parsed[0].advertised, 1);
        assert_eq!(parsed[0].received, 0);
    }

    #[test]
    fn render_rejects_missing_marker() {
        let err = render_page("<html></html>", &sample_reports()).unwrap_err();
        assert!(err.to_string().contains("found 0"));
    }

    #[test]
    fn render_rejects_duplicate_marker() {
        let err = render_page("__DATA__\n__DATA__", &sample_reports()).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }
}
