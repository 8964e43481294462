use tabled::Table;

use crate::{
    config::Config,
    error::Result,
    spotify::{artists, auth},
    types::ArtistTableRow,
    warning,
};

pub async fn search(config: &Config, artist_name: &str) -> Result<()> {
    let token = auth::acquire_app_token(config).await?;

    match artists::search_artist(config, artist_name, &token).await? {
        Some(artist) => {
            let table = Table::new([ArtistTableRow::from(&artist)]);
            println!("{}", table);
        }
        None => warning!("No artist found for \"{}\"", artist_name),
    }

    Ok(())
}
