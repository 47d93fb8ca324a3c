//! Shared fixtures for integration tests: a small reference dataset, a
//! linear model matching its encoder, and the reference request body.

#![allow(dead_code)]

use footprint_core::config::ArtifactConfig;
use footprint_core::features::EncoderStore;
use serde_json::json;
use std::path::Path;

pub const REFERENCE_CSV: &str = "\
Body Type,Sex,Diet,How Often Shower,Heating Energy Source,Transport,Vehicle Type,Social Activity,Monthly Grocery Bill,Frequency of Traveling by Air,Vehicle Monthly Distance Km,Waste Bag Size,Waste Bag Weekly Count,How Long TV PC Daily Hour,How Many New Clothes Monthly,How Long Internet Daily Hour,Energy efficiency,Recycling,Cooking_With,CarbonEmission
overweight,female,pescatarian,daily,coal,public,,often,230,frequently,210,large,4,7,26,1,No,['Metal'],\"['Stove', 'Oven']\",2238
obese,female,vegetarian,less frequently,natural gas,walk/bicycle,,often,114,rarely,9,extra large,3,9,38,5,No,['Metal'],\"['Stove', 'Microwave']\",1892
normal,male,omnivore,more frequently,wood,private,petrol,sometimes,138,never,2472,small,1,14,47,6,Sometimes,['Metal'],\"['Oven', 'Microwave']\",2595
normal,male,vegan,twice a day,electricity,private,diesel,never,250,very frequently,1800,medium,2,3,5,12,Yes,\"['Paper', 'Plastic', 'Glass']\",\"['Grill', 'Airfryer']\",4743
underweight,other,omnivore,daily,coal,public,,sometimes,57,rarely,0,medium,6,0,2,0,Sometimes,[],['Stove'],1001
";

/// Intercept of the fixture model; predictions are this plus the grocery bill.
pub const INTERCEPT: f64 = 1000.0;

/// The reference request from the service documentation.
pub fn example_body() -> serde_json::Value {
    json!({
        "body_type": "normal",
        "sex": "male",
        "diet": "omnivore",
        "shower": "daily",
        "heating": "gas",
        "transport": "private",
        "vehicle_type": "gasoline",
        "social_activity": "sometimes",
        "monthly_grocery_bill": 250,
        "flight": "occasionally",
        "vehicle_distance": 150,
        "waste_bag_size": "medium",
        "waste_weekly": 2,
        "tv_daily_hour": 2,
        "clothes_monthly": 10,
        "internet_daily": 5,
        "energy_efficiency": "No",
        "recycling": ["Paper", "Plastic"],
        "cooking": ["Stove"]
    })
}

/// Artifact locations inside `dir`, with the reference CSV written out.
pub fn artifacts_in(dir: &Path) -> ArtifactConfig {
    std::fs::write(dir.join("reference.csv"), REFERENCE_CSV).unwrap();
    ArtifactConfig {
        model_path: dir.join("model.json"),
        encoder_path: dir.join("encoder.json"),
        dataset_path: dir.join("reference.csv"),
    }
}

/// Write a linear model over `feature_names` weighting only the grocery bill.
pub fn write_model(path: &Path, feature_names: &[String]) {
    let coefficients: Vec<f64> = feature_names
        .iter()
        .map(|n| if n == "monthly_grocery_bill" { 1.0 } else { 0.0 })
        .collect();
    let model = json!({
        "kind": "linear",
        "intercept": INTERCEPT,
        "coefficients": coefficients,
        "feature_names": feature_names,
    });
    std::fs::write(path, serde_json::to_vec_pretty(&model).unwrap()).unwrap();
}

/// Fit the encoder from the reference CSV and write a model trained against it.
pub async fn prepare_artifacts(dir: &Path) -> ArtifactConfig {
    let artifacts = artifacts_in(dir);
    let encoder = EncoderStore::with_csv(&artifacts.encoder_path, &artifacts.dataset_path)
        .rebuild()
        .await
        .unwrap();
    write_model(&artifacts.model_path, encoder.feature_names());
    artifacts
}
