use cucumber::given;

use crate::cucumber::{market_world::Marketplace, MarketWorld};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketWorld) {
    let system = Marketplace::new().await;
    world.system = Some(system);
}
