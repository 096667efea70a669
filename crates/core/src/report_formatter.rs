#![allow(clippy::format_push_string)]

use rust_decimal::Decimal;

use crate::analysis::GexReport;

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn format(report: &GexReport) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            "            GEX PROFILE  {} {}\n",
            report.underlying, report.expiration
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        if report.is_empty() {
            output.push_str("⚠️  No usable strikes in this snapshot.\n");
            output.push_str("    The chain may be empty or not yet published.\n\n");
            return output;
        }

        output.push_str(&format!("Spot:                  ${:.2}\n", report.spot));
        output.push_str(&format!(
            "Gamma Regime:          {} ({})\n",
            report.levels.regime,
            report.levels.regime.description()
        ));
        output.push('\n');

        // Key levels
        output.push_str("Key Levels\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        let levels = &report.levels;
        output.push_str(&format!("Magnet:                {}\n", level(levels.magnet)));
        output.push_str(&format!("Gamma Flip:            {}\n", level(levels.flip)));
        output.push_str(&format!("Call Wall:             {}\n", level(levels.call_wall)));
        output.push_str(&format!("Put Wall:              {}\n", level(levels.put_wall)));
        output.push_str(&format!("Resistance:            {}\n", level(levels.resistance)));
        output.push_str(&format!("Support:               {}\n", level(levels.support)));
        output.push('\n');

        // Display range totals
        let summary = &report.summary;
        output.push_str(&format!(
            "Exposure (±{}% of spot, {} strikes)\n",
            (report.display_range_pct * Decimal::ONE_HUNDRED).normalize(),
            summary.strikes
        ));
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Net GEX:               {:.0}\n", summary.net_gex));
        output.push_str(&format!("Call GEX:              {:.0}\n", summary.call_gex));
        output.push_str(&format!("Put GEX:               {:.0}\n", summary.put_gex));
        output.push_str(&format!("Net DEX:               {:.0}\n", summary.net_dex));
        output.push_str(&format!("Total OI:              {}\n", summary.total_oi()));
        output.push_str(&format!("Total Volume:          {}\n", summary.total_volume()));
        output.push_str(&format!(
            "P/C Ratio (OI):        {:.2}\n",
            summary.put_call_oi_ratio
        ));
        output.push_str(&format!(
            "P/C Ratio (Volume):    {:.2}\n",
            summary.put_call_volume_ratio
        ));
        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        if levels.is_empty() {
            output.push_str("\n⚠️  No strikes inside the analysis window; levels unavailable.\n\n");
        }

        output
    }
}

fn level(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("${v:.2}"))
}
