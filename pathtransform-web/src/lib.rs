/// PathTransform Web - WASM bindings
///
/// Exposes representation parsing and path transforms to JavaScript.
/// Errors surface as thrown strings.

use wasm_bindgen::prelude::*;
use pathtransform_core::{parse_path_transform, AnyPathTransform, Path, PathTransform, Point};

fn to_array(point: Point) -> Vec<i64> {
    vec![point.x, point.y, point.z]
}

/// A growable path of integer micro-unit points
#[wasm_bindgen]
pub struct WasmPath {
    inner: Path,
}

#[wasm_bindgen]
impl WasmPath {
    #[wasm_bindgen(constructor)]
    pub fn new(capacity: usize) -> WasmPath {
        WasmPath {
            inner: Path::with_capacity(capacity),
        }
    }

    #[wasm_bindgen(js_name = pushBack)]
    pub fn push_back(&mut self, x: i64, y: i64, z: i64) {
        self.inner.push_back(Point::new(x, y, z));
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// `[x, y, z]` of the point at `index`
    pub fn point(&self, index: usize) -> Result<Vec<i64>, JsValue> {
        self.inner
            .point(index)
            .map(to_array)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// A decoded transform; immutable once constructed
#[wasm_bindgen]
pub struct WasmPathTransform {
    inner: AnyPathTransform,
}

#[wasm_bindgen]
impl WasmPathTransform {
    #[wasm_bindgen(constructor)]
    pub fn new(representation: &str) -> Result<WasmPathTransform, JsValue> {
        parse_path_transform(representation)
            .map(|inner| WasmPathTransform { inner })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    pub fn representation(&self) -> String {
        self.inner.to_representation()
    }

    #[wasm_bindgen(js_name = transformInPlace)]
    pub fn transform_in_place(&self, path: &mut WasmPath) {
        self.inner.transform_in_place(&mut path.inner);
    }

    pub fn transform(&self, path: &WasmPath) -> WasmPath {
        WasmPath {
            inner: self.inner.transform(&path.inner),
        }
    }

    #[wasm_bindgen(js_name = transformSingle)]
    pub fn transform_single(&self, x: i64, y: i64, z: i64) -> Vec<i64> {
        to_array(self.inner.transform_single(Point::new(x, y, z)))
    }
}
