use serde_json::{Map, Value};

use super::layer_type::LayerType;
use super::number_value;
use crate::errors::{CompilerError, CompilerResult, IntegrityError};

/// One layer object of a layer document, parsed into typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub layer_key: String,
    pub layer_type: LayerType,
    pub attributes: LayerAttributes,
    pub body: LayerBody,
}

/// Attributes common to every layer type. Keys that are not modelled here, or whose JSON type
/// does not match the model, are carried verbatim in `extras`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerAttributes {
    pub title: Option<String>,
    pub grid_xtype: Option<String>,
    pub id_property: Option<String>,
    pub label_class_name: Option<String>,
    pub legend_width: Option<f64>,
    pub visibility: Option<bool>,
    pub vector_features_min_scale: Option<f64>,
    pub feature_info_window: Option<bool>,
    pub has_metadata: Option<bool>,
    pub is_base_layer: Option<bool>,
    pub qtip: Option<String>,
    pub open_layers: Option<Map<String, Value>>,
    pub tooltips_config: Option<Vec<Value>>,
    pub grouping: Option<Map<String, Value>>,
    pub extras: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerBody {
    /// wms, wfs and arcgisrest
    Service(ServiceBody),
    Xyz(XyzBody),
    /// Ordered switchlayer children
    Switch(Vec<LayerSpec>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceBody {
    pub server_options: ServerOptions,
    pub styles: Vec<StyleSpec>,
    /// wfs only
    pub feature_type: Option<String>,
    /// wfs only
    pub geom_field_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerOptions {
    pub layers: Option<String>,
    pub order_by: Option<String>,
    pub property_name: Option<String>,
    pub version: Option<String>,
    pub max_resolution: Option<f64>,
    pub extras: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpec {
    pub name: String,
    pub title: String,
    pub label_rule: Option<String>,
    pub legend_url: Option<String>,
}

/// XYZ source. `url` is the resolved URL, token included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzBody {
    pub url: Option<String>,
    pub projection: Option<String>,
    pub tile_size: Option<Value>,
    pub attribution: Option<String>,
    pub extent: Option<Value>,
    pub tile_grid: Option<Value>,
}

/// Consumes recognised keys from a JSON object; whatever is left becomes extras.
struct Fields {
    rest: Map<String, Value>,
}

impl Fields {
    fn new(object: &Map<String, Value>) -> Self {
        Self {
            rest: object.clone(),
        }
    }

    fn take<T>(&mut self, key: &str, convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
        let converted = match self.rest.get(key)? {
            Value::Null => None,
            value => Some(convert(value)?),
        };
        self.rest.remove(key);
        converted
    }

    fn string(&mut self, key: &str) -> Option<String> {
        self.take(key, |v| v.as_str().map(str::to_string))
    }

    fn number(&mut self, key: &str) -> Option<f64> {
        self.take(key, Value::as_f64)
    }

    fn boolean(&mut self, key: &str) -> Option<bool> {
        self.take(key, Value::as_bool)
    }

    fn object(&mut self, key: &str) -> Option<Map<String, Value>> {
        self.take(key, |v| v.as_object().cloned())
    }

    fn array(&mut self, key: &str) -> Option<Vec<Value>> {
        self.take(key, |v| v.as_array().cloned())
    }

    fn any(&mut self, key: &str) -> Option<Value> {
        self.take(key, |v| Some(v.clone()))
    }

    fn into_extras(self) -> Map<String, Value> {
        self.rest
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect()
    }
}

fn non_empty_object(object: Option<Map<String, Value>>) -> Option<Map<String, Value>> {
    object.filter(|o| !o.is_empty())
}

impl LayerSpec {
    /// Parse one layer object. `source_name` names the document in errors.
    pub fn from_json(value: &Value, source_name: &str) -> CompilerResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| CompilerError::parse(source_name, "layer entry is not an object"))?;
        let layer_key = match object.get("layerKey") {
            Some(Value::String(key)) if !key.trim().is_empty() => key.clone(),
            _ => {
                return Err(CompilerError::parse(
                    source_name,
                    "layer entry has no string 'layerKey'",
                ))
            }
        };
        let layer_type = read_layer_type(object, &layer_key, source_name)?;

        let mut fields = Fields::new(object);
        fields.rest.remove("layerKey");
        fields.rest.remove("layerType");

        let body = match layer_type {
            LayerType::Wms | LayerType::Wfs | LayerType::ArcGisRest => {
                LayerBody::Service(parse_service_body(&mut fields, layer_type))
            }
            LayerType::Xyz => LayerBody::Xyz(parse_xyz_body(&mut fields)),
            LayerType::SwitchLayer => {
                LayerBody::Switch(parse_switch_children(&mut fields, &layer_key, source_name)?)
            }
        };

        let mut open_layers = fields.object("openLayers");
        if let (LayerBody::Xyz(xyz), Some(ol)) = (&body, open_layers.as_mut()) {
            // keys taken into the xyz body are not kept twice
            let moved = [
                ("projection", xyz.projection.is_some()),
                ("tileSize", xyz.tile_size.is_some()),
                ("attribution", xyz.attribution.is_some()),
                ("extent", xyz.extent.is_some()),
                ("tileGrid", xyz.tile_grid.is_some()),
            ];
            for (key, taken) in moved {
                if taken {
                    ol.remove(key);
                }
            }
        }

        let attributes = LayerAttributes {
            title: fields.string("title"),
            grid_xtype: fields.string("gridXType"),
            id_property: fields.string("idProperty"),
            label_class_name: fields.string("labelClassName"),
            legend_width: fields.number("legendWidth"),
            visibility: fields.boolean("visibility"),
            vector_features_min_scale: fields.number("vectorFeaturesMinScale"),
            feature_info_window: fields.boolean("featureInfoWindow"),
            has_metadata: fields.boolean("hasMetadata"),
            is_base_layer: fields.boolean("isBaseLayer"),
            qtip: fields.string("qtip"),
            open_layers: non_empty_object(open_layers),
            tooltips_config: fields.array("tooltipsConfig").filter(|a| !a.is_empty()),
            grouping: non_empty_object(fields.object("grouping")),
            extras: fields.into_extras(),
        };

        Ok(LayerSpec {
            layer_key,
            layer_type,
            attributes,
            body,
        })
    }

    /// Keys of a switchlayer's direct children, in order. Empty for other layers.
    pub fn child_keys(&self) -> Vec<&str> {
        match &self.body {
            LayerBody::Switch(children) => children.iter().map(|c| c.layer_key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Every non-structural field as JSON: everything except `layerType`, `layerKey` and the
    /// switchlayer `layers` array.
    pub fn attribute_fields(&self) -> Map<String, Value> {
        let attrs = &self.attributes;
        let mut out = Map::new();

        put_string(&mut out, "title", &attrs.title);
        put_string(&mut out, "gridXType", &attrs.grid_xtype);
        put_string(&mut out, "idProperty", &attrs.id_property);
        put_string(&mut out, "labelClassName", &attrs.label_class_name);
        if let Some(width) = attrs.legend_width {
            out.insert("legendWidth".to_string(), number_value(width));
        }
        put_bool(&mut out, "visibility", attrs.visibility);
        if let Some(scale) = attrs.vector_features_min_scale {
            out.insert("vectorFeaturesMinScale".to_string(), number_value(scale));
        }
        put_bool(&mut out, "featureInfoWindow", attrs.feature_info_window);
        put_bool(&mut out, "hasMetadata", attrs.has_metadata);
        put_bool(&mut out, "isBaseLayer", attrs.is_base_layer);
        put_string(&mut out, "qtip", &attrs.qtip);

        let mut open_layers = attrs.open_layers.clone().unwrap_or_default();
        if let LayerBody::Xyz(xyz) = &self.body {
            merge_xyz_open_layers(&mut open_layers, xyz);
        }
        if !open_layers.is_empty() {
            out.insert("openLayers".to_string(), Value::Object(open_layers));
        }
        if let Some(tips) = &attrs.tooltips_config {
            out.insert("tooltipsConfig".to_string(), Value::Array(tips.clone()));
        }
        if let Some(grouping) = &attrs.grouping {
            out.insert("grouping".to_string(), Value::Object(grouping.clone()));
        }

        match &self.body {
            LayerBody::Service(service) => {
                let server_options = service.server_options.to_json();
                if !server_options.is_empty() {
                    out.insert("serverOptions".to_string(), Value::Object(server_options));
                }
                put_string(&mut out, "featureType", &service.feature_type);
                put_string(&mut out, "geomFieldName", &service.geom_field_name);
                if !service.styles.is_empty() {
                    let styles = service.styles.iter().map(StyleSpec::to_json).collect();
                    out.insert("styles".to_string(), Value::Array(styles));
                }
            }
            LayerBody::Xyz(xyz) => put_string(&mut out, "url", &xyz.url),
            LayerBody::Switch(_) => {}
        }

        for (key, value) in &attrs.extras {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
        out
    }

    /// Full, unpruned JSON object for this layer
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("layerType".to_string(), Value::from(self.layer_type.as_str()));
        out.insert("layerKey".to_string(), Value::from(self.layer_key.clone()));
        out.extend(self.attribute_fields());
        if let LayerBody::Switch(children) = &self.body {
            let children = children.iter().map(LayerSpec::to_json).collect();
            out.insert("layers".to_string(), Value::Array(children));
        }
        Value::Object(out)
    }
}

impl ServerOptions {
    fn from_json(object: &Map<String, Value>) -> Self {
        let mut fields = Fields::new(object);
        ServerOptions {
            layers: fields.string("layers"),
            order_by: fields.string("ORDERBY"),
            property_name: fields.string("propertyname"),
            version: fields.string("version"),
            max_resolution: fields.number("maxResolution"),
            extras: fields.into_extras(),
        }
    }

    /// Only non-empty subfields are emitted
    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        let strings = [
            ("layers", &self.layers),
            ("ORDERBY", &self.order_by),
            ("propertyname", &self.property_name),
            ("version", &self.version),
        ];
        for (key, value) in strings {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                out.insert(key.to_string(), Value::from(value));
            }
        }
        if let Some(max_resolution) = self.max_resolution {
            out.insert("maxResolution".to_string(), number_value(max_resolution));
        }
        for (key, value) in &self.extras {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
        out
    }
}

impl StyleSpec {
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("name".to_string(), Value::from(self.name.clone()));
        out.insert("title".to_string(), Value::from(self.title.clone()));
        put_string(&mut out, "labelRule", &self.label_rule);
        put_string(&mut out, "legendUrl", &self.legend_url);
        Value::Object(out)
    }
}

fn read_layer_type(
    object: &Map<String, Value>,
    layer_key: &str,
    source_name: &str,
) -> CompilerResult<LayerType> {
    object
        .get("layerType")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CompilerError::parse(
                source_name,
                format!("layer '{}' has no string 'layerType'", layer_key),
            )
        })?
        .parse()
        .map_err(|reason| {
            CompilerError::parse(source_name, format!("layer '{}': {}", layer_key, reason))
        })
}

fn parse_service_body(fields: &mut Fields, layer_type: LayerType) -> ServiceBody {
    let server_options = fields
        .object("serverOptions")
        .map(|object| ServerOptions::from_json(&object))
        .unwrap_or_default();
    let styles = fields
        .array("styles")
        .map(|styles| parse_styles(&styles))
        .unwrap_or_default();
    let (feature_type, geom_field_name) = if layer_type == LayerType::Wfs {
        (fields.string("featureType"), fields.string("geomFieldName"))
    } else {
        (None, None)
    };

    ServiceBody {
        server_options,
        styles,
        feature_type,
        geom_field_name,
    }
}

fn parse_styles(styles: &[Value]) -> Vec<StyleSpec> {
    styles
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|style| {
            let name = style
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())?;
            let text = |key: &str| style.get(key).and_then(Value::as_str).map(str::to_string);
            Some(StyleSpec {
                name: name.to_string(),
                title: text("title").unwrap_or_else(|| name.to_string()),
                label_rule: text("labelRule"),
                legend_url: text("legendUrl"),
            })
        })
        .collect()
}

fn parse_xyz_body(fields: &mut Fields) -> XyzBody {
    let open_layers = fields
        .rest
        .get("openLayers")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let mut ol = Fields::new(&open_layers);

    XyzBody {
        url: fields.string("url"),
        projection: ol.string("projection"),
        tile_size: ol.any("tileSize"),
        attribution: ol.string("attribution"),
        extent: ol.any("extent"),
        tile_grid: ol.any("tileGrid"),
    }
}

fn merge_xyz_open_layers(open_layers: &mut Map<String, Value>, xyz: &XyzBody) {
    if let Some(projection) = &xyz.projection {
        open_layers.insert("projection".to_string(), Value::from(projection.clone()));
    }
    if let Some(tile_size) = &xyz.tile_size {
        open_layers.insert("tileSize".to_string(), tile_size.clone());
    }
    if let Some(attribution) = &xyz.attribution {
        open_layers.insert("attribution".to_string(), Value::from(attribution.clone()));
    }
    if let Some(extent) = &xyz.extent {
        open_layers.insert("extent".to_string(), extent.clone());
    }
    if let Some(tile_grid) = &xyz.tile_grid {
        open_layers.insert("tileGrid".to_string(), tile_grid.clone());
    }
}

fn parse_switch_children(
    fields: &mut Fields,
    parent_key: &str,
    source_name: &str,
) -> CompilerResult<Vec<LayerSpec>> {
    let children = match fields.rest.remove("layers") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(children)) => children,
        Some(_) => {
            return Err(CompilerError::parse(
                source_name,
                format!("switchlayer '{}' has a non-array 'layers'", parent_key),
            ))
        }
    };

    children
        .iter()
        .map(|child| {
            let object = child.as_object().ok_or_else(|| {
                CompilerError::parse(
                    source_name,
                    format!("switchlayer '{}' has a non-object child", parent_key),
                )
            })?;
            let child_key = object
                .get("layerKey")
                .and_then(Value::as_str)
                .unwrap_or("<no-key>");
            let child_type = read_layer_type(object, child_key, source_name)?;
            if !child_type.can_be_switch_child() {
                return Err(IntegrityError::InvalidSwitchChild {
                    parent: parent_key.to_string(),
                    child: child_key.to_string(),
                    child_type: child_type.to_string(),
                }
                .into());
            }
            LayerSpec::from_json(child, source_name)
        })
        .collect()
}

fn put_string(out: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        out.insert(key.to_string(), Value::from(value.clone()));
    }
}

fn put_bool(out: &mut Map<String, Value>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        out.insert(key.to_string(), Value::Bool(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_wfs_layer() {
        let raw = json!({
            "layerType": "wfs",
            "layerKey": "ROADS_WFS",
            "title": "Roads",
            "featureType": "roads",
            "geomFieldName": "msGeometry",
            "legendWidth": 120,
            "noCluster": false,
            "serverOptions": {"propertyname": "id,name", "maxResolution": 4.5, "srsName": "EPSG:2157"},
            "styles": [{"name": "default", "title": "Default"}, {"title": "nameless"}],
        });
        let spec = LayerSpec::from_json(&raw, "test.json").unwrap();

        assert_eq!(spec.layer_type, LayerType::Wfs);
        assert_eq!(spec.attributes.legend_width, Some(120.0));
        assert_eq!(spec.attributes.extras["noCluster"], json!(false));
        let LayerBody::Service(service) = &spec.body else {
            panic!("expected service body");
        };
        assert_eq!(service.feature_type.as_deref(), Some("roads"));
        assert_eq!(service.server_options.extras["srsName"], json!("EPSG:2157"));
        assert_eq!(service.styles.len(), 1);

        // the nameless style is the only thing dropped
        let mut expected = raw.clone();
        expected["styles"] = json!([{"name": "default", "title": "Default"}]);
        assert_eq!(spec.to_json(), expected);
    }

    #[test]
    fn test_mistyped_known_key_is_kept_verbatim() {
        let raw = json!({
            "layerType": "wms",
            "layerKey": "A",
            "visibility": "yes",
            "legendWidth": "auto",
        });
        let spec = LayerSpec::from_json(&raw, "test.json").unwrap();
        assert_eq!(spec.attributes.visibility, None);
        assert_eq!(spec.attributes.extras["visibility"], json!("yes"));
        assert_eq!(spec.to_json(), raw);
    }

    #[test]
    fn test_xyz_open_layers_split() {
        let raw = json!({
            "layerType": "xyz",
            "layerKey": "BASEMAP",
            "url": "https://x/{z}/{x}/{y}?access_token=ABC123",
            "openLayers": {
                "projection": "EPSG:3857",
                "tileSize": 512,
                "attribution": "&copy; Example",
                "extent": [0, 0, 1, 1],
                "transitionEffect": "resize",
            },
        });
        let spec = LayerSpec::from_json(&raw, "test.json").unwrap();

        assert_eq!(
            spec.attributes.open_layers,
            json!({"transitionEffect": "resize"}).as_object().cloned()
        );
        let LayerBody::Xyz(xyz) = &spec.body else {
            panic!("expected xyz body");
        };
        assert_eq!(xyz.projection.as_deref(), Some("EPSG:3857"));
        assert_eq!(xyz.tile_size, Some(json!(512)));
        assert_eq!(spec.to_json(), raw);
    }

    #[test]
    fn test_switch_children_in_order() {
        let raw = json!({
            "layerType": "switchlayer",
            "layerKey": "SW",
            "layers": [
                {"layerType": "wms", "layerKey": "B"},
                {"layerType": "wfs", "layerKey": "A"},
            ],
        });
        let spec = LayerSpec::from_json(&raw, "test.json").unwrap();
        assert_eq!(spec.child_keys(), vec!["B", "A"]);
        assert_eq!(spec.to_json(), raw);
    }

    #[test]
    fn test_nested_switchlayer_is_rejected() {
        let raw = json!({
            "layerType": "switchlayer",
            "layerKey": "SW",
            "layers": [{"layerType": "switchlayer", "layerKey": "INNER"}],
        });
        let err = LayerSpec::from_json(&raw, "test.json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SWITCH_CHILD");
    }

    #[test]
    fn test_missing_layer_key_is_parse_error() {
        let err = LayerSpec::from_json(&json!({"layerType": "wms"}), "bad.json").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
        assert!(err.to_string().contains("bad.json"));
    }
}
