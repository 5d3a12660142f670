//! Handler for the `show` command.

use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::ShowArgs;
use crate::application::report::{FlowTotals, MarketFlowSummary, SelectionFlowView};
use crate::domain::MarketId;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime;

#[derive(Tabled)]
struct FlowRow {
    #[tabled(rename = "Selection")]
    selection: String,
    #[tabled(rename = "Team")]
    team: String,
    #[tabled(rename = "In Back")]
    in_back: String,
    #[tabled(rename = "Out Back")]
    out_back: String,
    #[tabled(rename = "Net Back")]
    net_back: String,
    #[tabled(rename = "In Lay")]
    in_lay: String,
    #[tabled(rename = "Out Lay")]
    out_lay: String,
    #[tabled(rename = "Net Lay")]
    net_lay: String,
}

fn amount(value: f64) -> String {
    format!("{value:.2}")
}

impl From<&SelectionFlowView> for FlowRow {
    fn from(view: &SelectionFlowView) -> Self {
        Self {
            selection: view.selection_id.to_string(),
            team: view.team_label.clone(),
            in_back: amount(view.in_back),
            out_back: amount(view.out_back),
            net_back: amount(view.net_back),
            in_lay: amount(view.in_lay),
            out_lay: amount(view.out_lay),
            net_lay: amount(view.net_lay),
        }
    }
}

fn total_row(totals: &FlowTotals) -> FlowRow {
    FlowRow {
        selection: "TOTAL".into(),
        team: String::new(),
        in_back: amount(totals.in_back),
        out_back: amount(totals.out_back),
        net_back: amount(totals.net_back),
        in_lay: amount(totals.in_lay),
        out_lay: amount(totals.out_lay),
        net_lay: amount(totals.net_lay),
    }
}

/// Render a market summary as a table with a totals row.
#[must_use]
pub fn render_table(summary: &MarketFlowSummary) -> String {
    if summary.is_empty() {
        return format!("No cumulative flow recorded for market {}", summary.market_id);
    }

    let mut rows: Vec<FlowRow> = summary.selections.iter().map(FlowRow::from).collect();
    rows.push(total_row(&summary.totals));

    let mut out = format!("Market {}", summary.market_id);
    if let Some(updated_at) = summary.updated_at {
        out.push_str(&format!(" (updated {})", updated_at.to_rfc3339()));
    }
    out.push('\n');
    out.push_str(&Table::new(rows).to_string());
    out
}

/// Execute the show command.
pub async fn execute(config: &Config, args: &ShowArgs) -> Result<()> {
    let market_id = MarketId::try_new(args.market_id.as_str())?;
    let summary = runtime::show_market(config, &market_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", render_table(&summary));
    }
    Ok(())
}
