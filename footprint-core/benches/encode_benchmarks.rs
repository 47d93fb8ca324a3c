use criterion::{Criterion, black_box, criterion_group, criterion_main};
use footprint_core::data::source::parse_csv;
use footprint_core::features::{Encoder, normalize};
use footprint_core::inference::{LinearModel, Predictor};
use footprint_core::record::{Selection, StructuredRecord};

fn record() -> StructuredRecord {
    StructuredRecord {
        body_type: "normal".into(),
        sex: "male".into(),
        diet: "omnivore".into(),
        shower: "daily".into(),
        heating: "natural gas".into(),
        transport: "private".into(),
        vehicle_type: "petrol".into(),
        social_activity: "sometimes".into(),
        monthly_grocery_bill: 250.0,
        flight: "rarely".into(),
        vehicle_distance: 150.0,
        waste_bag_size: "medium".into(),
        waste_weekly: 2.0,
        tv_daily_hour: 2.0,
        clothes_monthly: 10.0,
        internet_daily: 5.0,
        energy_efficiency: "No".into(),
        recycling: Selection::List(vec!["Paper".into(), "Plastic".into()]),
        cooking: Selection::Text("['Stove', 'Oven']".into()),
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let record = record();
    let encoder = Encoder::fit(&[normalize(&record)]).unwrap();
    let model = LinearModel {
        intercept: 1000.0,
        coefficients: vec![0.5; encoder.width()],
        feature_names: None,
    };

    c.bench_function("validate_record", |b| {
        b.iter(|| black_box(&record).validate())
    });

    c.bench_function("normalize_record", |b| {
        b.iter(|| normalize(black_box(&record)))
    });

    let map = normalize(&record);
    c.bench_function("encode_map", |b| b.iter(|| encoder.encode(black_box(&map))));

    c.bench_function("normalize_encode_predict", |b| {
        b.iter(|| {
            let values = encoder.transform(&normalize(black_box(&record)));
            model.predict(&values)
        })
    });
}

fn bench_csv(c: &mut Criterion) {
    let row = "normal,male,omnivore,daily,coal,private,petrol,often,230,rarely,210,large,4,7,26,1,No,\"['Paper', 'Plastic']\",\"['Stove', 'Oven']\",2238\n";
    let content = row.repeat(1000);
    c.bench_function("parse_csv_1000_rows", |b| {
        b.iter(|| parse_csv(black_box(&content), ','))
    });
}

criterion_group!(benches, bench_pipeline, bench_csv);
criterion_main!(benches);
