pub mod archi;

use crate::bot::Result;
use crate::core::state::State;

pub async fn init(state: &State) -> Result {
    archi::init(state).await?;

    Ok(())
}
