use anyhow::Result;
use geoclip_core::config::LayeredConfig;
use tabled::Tabled;

use crate::output::OutputWriter;

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = rows
            .into_iter()
            .map(|row| (row.key, serde_json::json!({ "value": row.value, "source": row.source })))
            .collect();
        return output.data(&map);
    }

    output.section("Effective configuration");
    output.table(rows);
    Ok(())
}
