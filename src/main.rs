use brewlp::{optimise_salts, Ion, IonProfile, SaltTable};

use log::error;

fn main() {
    env_logger::init();

    let wellington = IonProfile::new()
        .with(Ion::Calcium, 38)
        .with(Ion::Magnesium, 9)
        .with(Ion::Sodium, 12)
        .with(Ion::Chloride, 15)
        .with(Ion::Sulfate, 4);

    let balanced = IonProfile::new()
        .with(Ion::Calcium, 80)
        .with(Ion::Magnesium, 5)
        .with(Ion::Sodium, 25)
        .with(Ion::Chloride, 75)
        .with(Ion::Sulfate, 80);

    let table = SaltTable::default();
    match optimise_salts(&wellington, &balanced, &table) {
        Ok(additions) => {
            for (salt, amount) in additions.iter() {
                println!("{} grams per litre of {}", amount, salt);
            }
        }
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
