//! Headless crafter: one separator build running against scripted
//! neighbors, switching recipes halfway and saving its state.
//!
//! Run with: `cargo run -p multicrafter-core --example headless_crafter --features test-utils`
//! Set `RUST_LOG=debug` (or `trace`) to see recipe switches and crafts.

use std::sync::Arc;

use env_logger::{Builder, Env};
use log::LevelFilter;
use multicrafter_core::block::{BlockConfig, BlockType};
use multicrafter_core::config::ConfigValue;
use multicrafter_core::consumption;
use multicrafter_core::crafter::{CrafterBuild, EffectTrigger, TickContext};
use multicrafter_core::fixed::{fixed64_to_f64, Fixed64};
use multicrafter_core::recipe::RecipeDef;
use multicrafter_core::routing::{Direction, OutputKind, PackedRoute};
use multicrafter_core::storage::{BuildStorage, Storage};
use multicrafter_core::test_utils::*;

fn init_logging() {
    let env = Env::default().default_filter_or(LevelFilter::Info.to_string());
    let _ = Builder::from_env(env).try_init();
}

fn main() {
    init_logging();

    let config = BlockConfig {
        item_output_directions: vec![Some(Direction::Right), Some(Direction::Up)],
        default_update_effect: Some(multicrafter_core::id::EffectId(1)),
        ..BlockConfig::default()
    };
    let recipes = vec![
        RecipeDef::builder("separate")
            .craft_time_seconds(0.5)
            .item_in(iron(), 2)
            .liquid_in_per_second(water(), 6.0)
            .power_use_per_second(30.0)
            .item_out(gear(), 1)
            .item_out(copper(), 1)
            .build(),
        RecipeDef::builder("boil")
            .craft_time_seconds(1.0)
            .liquid_in_per_second(water(), 12.0)
            .liquid_out_per_second(steam(), 24.0)
            .heat_requirement(4.0)
            .build(),
    ];
    let block = match BlockType::new("separator", config, recipes) {
        Ok(block) => Arc::new(block),
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };

    let mut build = CrafterBuild::new(Arc::clone(&block), 2024);
    let mut storage = BuildStorage::with_items(&[(iron(), 20)]);
    storage.add_liquid(water(), fixed(30.0));
    let mut near = TestProximity::new(vec![
        TestNeighbor::sink(Direction::Right),
        TestNeighbor::sink(Direction::Up),
        TestNeighbor::sink(Direction::Left),
    ]);

    // Send copper down the left side instead of up.
    let packed = PackedRoute::new(OutputKind::Item, 1, Direction::Left).pack();
    build.configure(ConfigValue::Route { recipe: 0, packed });

    let heat = [fixed(3.0), fixed(2.0), Fixed64::ZERO, Fixed64::ZERO];
    let mut effects = 0;
    for tick in 0..600u32 {
        if tick == 300 {
            build.configure(ConfigValue::Recipe(1));
            storage.add_liquid(water(), fixed(30.0));
        }

        let efficiency = build.compute_efficiency(&storage, Fixed64::ONE, true);
        let recipe = build.current_recipe().clone();
        consumption::consume_continuous(&recipe, &mut storage, efficiency, Fixed64::ONE);

        let ctx = TickContext::new(efficiency).with_heat(heat).visible();
        let report = build.tick(&ctx, &mut storage, &mut near);
        effects += report
            .effects
            .iter()
            .filter(|e| matches!(e, EffectTrigger::Update { .. }))
            .count();

        if tick % 60 == 59 {
            println!(
                "t={:>3} recipe={} progress={:.3} warmup={:.3} iron={} water={:.2} steam={:.2}",
                tick + 1,
                build.current_recipe().label(build.recipe_index()),
                fixed64_to_f64(build.progress()),
                fixed64_to_f64(build.warmup()),
                storage.item(iron()),
                fixed64_to_f64(storage.liquid(water())),
                fixed64_to_f64(storage.liquid(steam())),
            );
        }
    }

    println!();
    for n in &near.neighbors {
        println!(
            "{:?}: gear={} copper={} steam={:.2}",
            n.side,
            n.received(gear()),
            n.received(copper()),
            fixed64_to_f64(n.liquid(steam())),
        );
    }
    println!("update effects fired: {effects}");
    println!("total progress: {:.2}", fixed64_to_f64(build.total_progress()));

    match build.save() {
        Ok(data) => println!("saved build: {} bytes", data.len()),
        Err(e) => log::error!("save failed: {e}"),
    }
}
