use crate::header::{PropertyDescriptor, PropertyRole, ScalarType};

/// One property group placed inside a binary vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutField {
    pub role: PropertyRole,
    pub scalar_type: ScalarType,
    pub group_size: usize,
    /// Byte offset of the first scalar within the record.
    pub offset: usize,
}

impl LayoutField {
    pub fn byte_width(&self) -> usize {
        self.scalar_type.size_bytes() * self.group_size
    }

    /// Byte offset of the `index`-th scalar of the group.
    pub fn scalar_offset(&self, index: usize) -> usize {
        self.offset + index * self.scalar_type.size_bytes()
    }
}

/// Record layout of a vertex, resolved once from the header.
///
/// Offsets follow declaration order exactly; a header that declares `red`
/// before `x` yields a color group at offset 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    fields: Vec<LayoutField>,
    position: Option<LayoutField>,
    normal: Option<LayoutField>,
    color: Option<LayoutField>,
    alpha: Option<LayoutField>,
    stride: usize,
}

impl VertexLayout {
    pub fn from_properties(properties: &[PropertyDescriptor]) -> Self {
        let mut layout = VertexLayout::default();

        for property in properties {
            let field = LayoutField {
                role: property.role,
                scalar_type: property.scalar_type,
                group_size: property.group_size,
                offset: layout.stride,
            };
            layout.stride += field.byte_width();
            layout.fields.push(field);

            // A repeated group still occupies its bytes, but the first one wins.
            let slot = match field.role {
                PropertyRole::Position => &mut layout.position,
                PropertyRole::Normal => &mut layout.normal,
                PropertyRole::ColorRed => &mut layout.color,
                PropertyRole::Alpha => &mut layout.alpha,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(field);
            }
        }

        layout
    }

    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    /// Byte length of one binary record.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn position(&self) -> Option<&LayoutField> {
        self.position.as_ref()
    }

    pub fn normal(&self) -> Option<&LayoutField> {
        self.normal.as_ref()
    }

    pub fn color(&self) -> Option<&LayoutField> {
        self.color.as_ref()
    }

    /// Parsed for completeness; alpha never reaches the point cloud.
    pub fn alpha(&self) -> Option<&LayoutField> {
        self.alpha.as_ref()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn has_normal(&self) -> bool {
        self.normal.is_some()
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(name: &str, scalar_type: ScalarType) -> PropertyDescriptor {
        PropertyDescriptor::group_leader(name, scalar_type).unwrap()
    }

    #[test]
    fn test_full_layout() {
        let layout = VertexLayout::from_properties(&[
            leader("x", ScalarType::Float),
            leader("nx", ScalarType::Float),
            leader("red", ScalarType::UChar),
            leader("alpha", ScalarType::UChar),
        ]);

        assert_eq!(layout.stride(), 12 + 12 + 3 + 1);
        assert_eq!(layout.position().unwrap().offset, 0);
        assert_eq!(layout.normal().unwrap().offset, 12);
        assert_eq!(layout.color().unwrap().offset, 24);
        assert_eq!(layout.alpha().unwrap().offset, 27);
        assert_eq!(layout.fields().len(), 4);
        assert!(layout.has_alpha());
    }

    #[test]
    fn test_declaration_order_defines_offsets() {
        let layout = VertexLayout::from_properties(&[
            leader("red", ScalarType::UChar),
            leader("x", ScalarType::Float),
        ]);

        assert_eq!(layout.color().unwrap().offset, 0);
        assert_eq!(layout.position().unwrap().offset, 3);
        assert_eq!(layout.position().unwrap().scalar_offset(2), 11);
        assert_eq!(layout.stride(), 15);
        assert!(!layout.has_normal());
    }

    #[test]
    fn test_empty_layout() {
        let layout = VertexLayout::from_properties(&[]);
        assert_eq!(layout.stride(), 0);
        assert!(!layout.has_position());
        assert!(!layout.has_color());
    }
}
