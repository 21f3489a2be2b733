use serde_json::{Map, Value, json};

const SENTINEL2_COLLECTION: &str = "COPERNICUS/S2_SR_HARMONIZED";
const CHIRPS_COLLECTION: &str = "UCSB-CHG/CHIRPS/DAILY";
const NDVI_SCALE_METERS: f64 = 10.0;
const RAINFALL_SCALE_METERS: f64 = 5000.0;

/// Builds the serialized expression graph the engine evaluates server-side.
/// Nodes live in a `values` map keyed by insertion order; arguments refer to
/// earlier nodes by key.
struct ExpressionBuilder {
    values: Map<String, Value>,
}

impl ExpressionBuilder {
    fn new() -> Self {
        Self { values: Map::new() }
    }

    fn invoke(&mut self, function_name: &str, arguments: Value) -> String {
        let key = self.values.len().to_string();
        self.values.insert(
            key.clone(),
            json!({
                "functionInvocationValue": {
                    "functionName": function_name,
                    "arguments": arguments,
                }
            }),
        );
        key
    }

    fn finish(self, result: &str) -> Value {
        json!({
            "expression": {
                "values": Value::Object(self.values),
                "result": result,
            }
        })
    }
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn reference(key: &str) -> Value {
    json!({ "valueReference": key })
}

fn year_window(year: i32) -> (String, String) {
    (format!("{year}-01-01"), format!("{year}-12-31"))
}

/// Least-cloudy Sentinel-2 scene of the year, NDVI sampled at the point.
pub fn ndvi_at_point(lat: f64, lon: f64, year: i32) -> Value {
    let (start, end) = year_window(year);
    let mut builder = ExpressionBuilder::new();

    let point = builder.invoke(
        "GeometryConstructors.Point",
        json!({ "coordinates": constant(json!([lon, lat])) }),
    );
    let collection = builder.invoke(
        "ImageCollection.load",
        json!({ "id": constant(json!(SENTINEL2_COLLECTION)) }),
    );
    let bounds_filter = builder.invoke(
        "Filter.intersects",
        json!({
            "leftField": constant(json!(".all")),
            "rightValue": reference(&point),
        }),
    );
    let bounded = builder.invoke(
        "Collection.filter",
        json!({
            "collection": reference(&collection),
            "filter": reference(&bounds_filter),
        }),
    );
    let date_filter = builder.invoke(
        "Filter.date",
        json!({
            "start": constant(json!(start)),
            "end": constant(json!(end)),
        }),
    );
    let dated = builder.invoke(
        "Collection.filter",
        json!({
            "collection": reference(&bounded),
            "filter": reference(&date_filter),
        }),
    );
    let sorted = builder.invoke(
        "Collection.limit",
        json!({
            "collection": reference(&dated),
            "key": constant(json!("CLOUDY_PIXEL_PERCENTAGE")),
            "ascending": constant(json!(true)),
        }),
    );
    let first = builder.invoke(
        "Collection.first",
        json!({ "collection": reference(&sorted) }),
    );
    let difference = builder.invoke(
        "Image.normalizedDifference",
        json!({
            "input": reference(&first),
            "bandNames": constant(json!(["B8", "B4"])),
        }),
    );
    let renamed = builder.invoke(
        "Image.rename",
        json!({
            "input": reference(&difference),
            "names": constant(json!(["NDVI"])),
        }),
    );
    let reducer = builder.invoke("Reducer.first", json!({}));
    let reduced = builder.invoke(
        "Image.reduceRegion",
        json!({
            "image": reference(&renamed),
            "reducer": reference(&reducer),
            "geometry": reference(&point),
            "scale": constant(json!(NDVI_SCALE_METERS)),
        }),
    );
    let value = builder.invoke(
        "Dictionary.get",
        json!({
            "dictionary": reference(&reduced),
            "key": constant(json!("NDVI")),
        }),
    );

    builder.finish(&value)
}

/// Total CHIRPS daily precipitation over the year, sampled at the point.
pub fn annual_rainfall_at_point(lat: f64, lon: f64, year: i32) -> Value {
    let (start, end) = year_window(year);
    let mut builder = ExpressionBuilder::new();

    let point = builder.invoke(
        "GeometryConstructors.Point",
        json!({ "coordinates": constant(json!([lon, lat])) }),
    );
    let collection = builder.invoke(
        "ImageCollection.load",
        json!({ "id": constant(json!(CHIRPS_COLLECTION)) }),
    );
    let bounds_filter = builder.invoke(
        "Filter.intersects",
        json!({
            "leftField": constant(json!(".all")),
            "rightValue": reference(&point),
        }),
    );
    let bounded = builder.invoke(
        "Collection.filter",
        json!({
            "collection": reference(&collection),
            "filter": reference(&bounds_filter),
        }),
    );
    let date_filter = builder.invoke(
        "Filter.date",
        json!({
            "start": constant(json!(start)),
            "end": constant(json!(end)),
        }),
    );
    let dated = builder.invoke(
        "Collection.filter",
        json!({
            "collection": reference(&bounded),
            "filter": reference(&date_filter),
        }),
    );
    let summed = builder.invoke("reduce.sum", json!({ "collection": reference(&dated) }));
    let reducer = builder.invoke("Reducer.first", json!({}));
    let reduced = builder.invoke(
        "Image.reduceRegion",
        json!({
            "image": reference(&summed),
            "reducer": reference(&reducer),
            "geometry": reference(&point),
            "scale": constant(json!(RAINFALL_SCALE_METERS)),
        }),
    );
    let value = builder.invoke(
        "Dictionary.get",
        json!({
            "dictionary": reference(&reduced),
            "key": constant(json!("precipitation")),
        }),
    );

    builder.finish(&value)
}
