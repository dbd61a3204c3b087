use chemviz_core::{formatting::format_number, model::Summary};
use maud::{html, Markup};

/// Returns the markup showing the result of one upload: the summary figures,
/// a bar chart of the equipment types and every uploaded row.
pub fn summary_view(filename: &str, summary: &Summary) -> Markup {
    html! {
        section.summary {
            h2 { "Results for " (filename) }
            table {
                tbody {
                    tr { th { "Total Equipment" } td { (summary.total_equipment) } }
                    tr { th { "Average Flowrate" } td { (format_number(summary.avg_flowrate)) } }
                    tr { th { "Average Pressure" } td { (format_number(summary.avg_pressure)) } }
                    tr {
                        th { "Average Temperature" }
                        td { (format_number(summary.avg_temperature)) }
                    }
                }
            }

            h3 { "Equipment Type Distribution" }
            (distribution_chart(summary))

            h3 { "Equipment" }
            (data_table(summary))
        }
    }
}

/// A horizontal bar per equipment type, sized by its share of the rows.
fn distribution_chart(summary: &Summary) -> Markup {
    let total = summary.total_equipment.max(1) as f64;

    html! {
        table.distribution {
            tbody {
                @for (equipment_type, count) in &summary.equipment_type_distribution {
                    @let share = *count as f64 * 100.0 / total;
                    tr {
                        th { (equipment_type) }
                        td { (count) }
                        td style="width: 300px" {
                            div style=(format!(
                                "width: {share:.1}%; background: steelblue; height: 1em"
                            )) {}
                        }
                    }
                }
            }
        }
    }
}

/// The uploaded rows with every column, in header order.
fn data_table(summary: &Summary) -> Markup {
    let Some(first) = summary.table_data.first() else {
        return html! {};
    };

    html! {
        table.data {
            thead {
                tr {
                    @for column in first.keys() {
                        th { (column) }
                    }
                }
            }
            tbody {
                @for row in &summary.table_data {
                    tr {
                        @for cell in row.values() {
                            td { (cell) }
                        }
                    }
                }
            }
        }
    }
}
