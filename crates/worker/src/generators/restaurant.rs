//! Restaurant dimension.

use async_trait::async_trait;
use etl_core::{RestaurantDim, Result, SourceRestaurant};

use crate::job::{Generator, MapContext, SourceAccess};

/// One row per source restaurant, with the mean of its rated orders.
///
/// The mean is looked up per restaurant from the map task's own
/// connection. Restaurants without rated orders get 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestaurantGenerator;

#[async_trait]
impl Generator for RestaurantGenerator {
    type Input = SourceRestaurant;
    type Record = RestaurantDim;

    fn name(&self) -> &'static str {
        "dim_restaurant"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::InputAndTasks
    }

    async fn read_input(&self, ctx: &mut MapContext) -> Result<Vec<SourceRestaurant>> {
        ctx.source()?.restaurants().await
    }

    async fn map(
        &self,
        restaurant: SourceRestaurant,
        ctx: &mut MapContext,
    ) -> Result<Vec<RestaurantDim>> {
        let avg_rating = ctx
            .source()?
            .average_rating(restaurant.restaurant_id)
            .await?
            .unwrap_or(0.0);

        Ok(vec![RestaurantDim {
            restaurant_id: restaurant.restaurant_id,
            name: restaurant.restaurant_name,
            cuisine_type: restaurant.cuisine_type,
            avg_rating,
        }])
    }
}
