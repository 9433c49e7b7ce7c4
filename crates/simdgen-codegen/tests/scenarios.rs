//! Scenario tests for generated units.

use simdgen_catalog::{Catalog, Layout, MatrixSpec, NumericKind, ScalarSize, TypeDescriptor, VectorSpec, WidthSet};
use simdgen_codegen::{lanes, matrix_unit, vector_unit, NativeInverse, UnitOptions};

fn vector_text(catalog: &Catalog, name: &str, width: u8) -> String {
    let scalar = catalog.get(name).unwrap();
    let spec = VectorSpec {
        scalar,
        boolean: catalog.boolean_of(scalar).unwrap(),
        width,
    };
    vector_unit(catalog, spec, &UnitOptions::default()).text
}

#[test]
fn float4_has_full_surface_but_no_cross() {
    let catalog = Catalog::builtin().unwrap();
    let text = vector_text(&catalog, "float", 4);

    for op in ["Add", "Sub", "Mul", "Div"] {
        assert!(text.contains(&format!("impl std::ops::{op} for float4")), "{op}");
        assert!(text.contains(&format!("impl std::ops::{op}<f32> for float4")), "{op}<f32>");
        assert!(text.contains(&format!("impl std::ops::{op}<float4> for f32")), "f32 {op}");
    }
    for reduce in ["reduce_add", "reduce_min", "reduce_max"] {
        assert!(text.contains(&format!("fn {reduce}(self) -> Self::Scalar")), "{reduce}");
    }

    // One plain conversion per catalog scalar, no saturating ones.
    for dst in catalog.iter() {
        let signature = format!("fn to_{}(self) -> {}4 {{", dst.name, dst.name);
        assert_eq!(text.matches(&signature).count(), 1, "{signature}");
    }
    assert!(!text.contains("_sat(self)"));

    assert!(text.contains("impl Dot<float4> for float4"));
    assert!(text.contains("(self * other).reduce_add()"));
    assert!(text.contains("impl Float for float4"));
    assert!(text.contains("impl Geometry for float4"));
    assert!(!text.contains("impl Cross"));
    assert!(!text.contains("impl Integer"));
}

#[test]
fn integer_units_carry_saturating_conversions() {
    let catalog = Catalog::builtin().unwrap();
    let text = vector_text(&catalog, "int", 16);

    let integers: Vec<_> = catalog.iter().filter(|d| d.is_integer()).collect();
    for dst in &integers {
        assert!(text.contains(&format!("fn to_{}_sat(self) -> {}16", dst.name, dst.name)));
    }
    assert!(!text.contains("fn to_float_sat"));
    assert!(!text.contains("fn to_double_sat"));
    assert!(text.contains(
        "self.clamp(Self::broadcast(i16::MIN as i32), Self::broadcast(i16::MAX as i32)).to_short()"
    ));
    assert!(text.contains("fn to_uint_sat(self) -> uint16 {\n    self.max(Self::broadcast(0)).to_uint()\n  }"));
}

#[test]
fn uchar3_to_uint_is_per_lane() {
    let catalog = Catalog::builtin().unwrap();
    let text = vector_text(&catalog, "uchar", 3);

    assert!(text.contains(
        "fn to_uint(self) -> uint3 {\n    uint3(self.0 as u32, self.1 as u32, self.2 as u32)\n  }"
    ));
    // The saturating form defers to the per-lane plain method.
    assert!(text.contains("fn to_uint_sat(self) -> uint3 {\n    self.to_uint()\n  }"));

    let wide = vector_text(&catalog, "uchar", 4);
    assert!(wide.contains("fn to_uint(self) -> uint4 {\n    unsafe { simd_cast(self) }\n  }"));
}

#[test]
fn float_reductions_at_width_three_lead_with_last_lane() {
    let catalog = Catalog::builtin().unwrap();
    let float = vector_text(&catalog, "float", 3);
    assert!(float.contains("self.2.min(self.lo().reduce_min())"));
    assert!(float.contains("self.2.max(self.lo().reduce_max())"));

    let short = vector_text(&catalog, "short", 3);
    assert!(short.contains("std::cmp::min(self.lo().reduce_min(), self.2)"));
    assert!(short.contains("self.0 & self.1 & self.2"));
}

#[test]
fn narrow_catalog_limits_widths_and_aliases() {
    let entries = vec![
        TypeDescriptor::new("int", ScalarSize::Four, NumericKind::SignedInteger, 16, "int"),
        TypeDescriptor::new("half", ScalarSize::Four, NumericKind::Float, 4, "int"),
    ];
    let catalog = Catalog::new(entries).unwrap();
    assert_eq!(catalog.vector_specs(WidthSet::vector()).len(), 8);

    let int8 = vector_text(&catalog, "int", 8);
    assert!(int8.contains("type IntVector = int8;"));
    assert!(!int8.contains("HalfVector"));
    assert!(!int8.contains("impl Select<half8>"));

    let int4 = vector_text(&catalog, "int", 4);
    assert!(int4.contains("type HalfVector = half4;"));
    assert!(int4.contains("impl Select<half4> for int4"));
    assert!(int4.contains("fn to_half(self) -> half4"));
}

#[test]
fn type_layout_scalar_units() {
    let catalog = Catalog::builtin().unwrap();
    let specs = catalog.vector_specs(Layout::Type.widths());
    assert_eq!(specs.len(), 60);

    let options = UnitOptions {
        layout: Layout::Type,
        ..UnitOptions::default()
    };
    let double1 = specs
        .iter()
        .find(|s| s.scalar.name == "double" && s.width == 1)
        .copied()
        .unwrap();
    let unit = vector_unit(&catalog, double1, &options);
    assert_eq!(unit.name, "type_double1");
    assert!(unit.text.contains("pub type double1 = f64;"));
    assert!(unit.text.contains("impl Float for f64"));
    assert!(unit.text.contains("impl Geometry for f64"));
    assert!(unit.text.contains("fn reduce_add(self) -> Self::Scalar {\n    self\n  }"));
    assert!(unit.text.contains("fn to_int(self) -> int1 {\n    self as i32\n  }"));
    assert!(!unit.text.contains("impl Cross"));
}

#[test]
fn square_float_matrix() {
    let catalog = Catalog::builtin().unwrap();
    let spec = MatrixSpec {
        scalar: catalog.get("float").unwrap(),
        rows: 4,
        cols: 4,
    };
    let unit = matrix_unit(spec, &NativeInverse::default(), &UnitOptions::default());
    assert_eq!(unit.name, "matrix_float4x4");

    // Each identity column is the matching basis vector.
    let identity = lanes::identity_plan(4);
    let columns: Vec<String> = identity
        .iter()
        .map(|unit| {
            let lanes: Vec<_> = unit.iter().map(|&one| if one { "1.0" } else { "0.0" }).collect();
            format!("float4({})", lanes.join(", "))
        })
        .collect();
    assert!(unit.text.contains(&format!("float4x4({})", columns.join(", "))));
    assert!(unit.text.contains("pub fn identity() -> Self"));
    assert_eq!(columns[2], "float4(0.0, 0.0, 1.0, 0.0)");

    // The square transpose maps onto the same shape.
    assert!(unit.text.contains("pub fn transpose(self) -> float4x4"));
    assert!(unit.text.contains("let c3 = float4(self.0.3, self.1.3, self.2.3, self.3.3);"));

    let m: Vec<Vec<f32>> = (0..4)
        .map(|c| (0..4).map(|r| (c * 4 + r) as f32).collect())
        .collect();
    assert_eq!(lanes::transpose(&lanes::transpose(&m)), m);
}

#[test]
fn every_matrix_shape_renders() {
    let catalog = Catalog::builtin().unwrap();
    let inverse = NativeInverse::default();
    let specs = catalog.matrix_specs();
    assert_eq!(specs.len(), 18);

    for spec in specs {
        let unit = matrix_unit(spec, &inverse, &UnitOptions::default());
        assert_eq!(unit.text.contains("pub fn inverse"), spec.is_square(), "{}", unit.name);
        assert!(unit.text.contains("pub fn linear_combination"));
        assert!(unit.text.contains(&format!("pub fn transpose(self) -> {}", spec.transpose_name())));
    }
}
