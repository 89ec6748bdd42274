//! Inventory command: report tile availability over a date range

use crate::app::services::inventory::{TileInventory, render_json, render_text};
use crate::cli::args::InventoryArgs;
use crate::config::IndicatorConfig;
use crate::error::{IndicatorError, Result};
use tracing::info;

pub fn run_inventory(args: InventoryArgs) -> Result<()> {
    if args.start > args.end {
        return Err(IndicatorError::InvalidDateRange {
            start: args.start,
            end: args.end,
        });
    }

    let mut config = IndicatorConfig::load_layered(args.config_file.as_deref())?;
    if let Some(tiles_dir) = &args.tiles_dir {
        config.tiles.tiles_dir = Some(tiles_dir.clone());
    }
    let tiles_dir = config.tiles.resolve_tiles_dir();
    info!("Scanning {}", tiles_dir.display());

    let inventory = TileInventory::scan(&tiles_dir, args.start, args.end)?;
    let days = inventory.days(args.start, args.end);

    if args.json {
        println!("{}", render_json(&days)?);
    } else {
        print!("{}", render_text(&days));
    }
    Ok(())
}
