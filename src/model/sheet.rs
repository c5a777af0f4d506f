use crate::model::line_item::clean_text;
use crate::model::{Columns, Field, LineItem, Mapping};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options that govern how a sheet is written back to its store.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// When `true`, derived columns that the sheet lacks are appended to its header row. When
    /// `false`, the header row is written exactly as it was loaded.
    pub structure_edit: bool,
}

impl SaveOptions {
    pub fn new(structure_edit: bool) -> Self {
        Self { structure_edit }
    }
}

/// Whether a sheet derives its totals from quantities or stores them directly.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBasis {
    /// The sheet has a quantity column: `line_total` is `unit_cost × quantity`.
    Derived,
    /// Legacy sheets with only a total column. Totals are entered by hand and left alone.
    TotalOnly,
}

serde_plain::derive_display_from_serialize!(PricingBasis);

impl PricingBasis {
    pub fn of(columns: &Columns) -> Self {
        if columns.contains(Field::Quantity) {
            PricingBasis::Derived
        } else {
            PricingBasis::TotalOnly
        }
    }

    /// Derived columns a structure edit may add to a sheet of this basis.
    fn addable(self, columns: &Columns) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| f.is_derived() && !columns.contains(*f))
            .filter(|f| match self {
                PricingBasis::Derived => true,
                // Totals are entered by hand here, only payments follow from the status.
                PricingBasis::TotalOnly => {
                    *f == Field::AmountPaid && columns.contains(Field::PaymentStatus)
                }
            })
            .collect()
    }
}

/// One room's table of line items, normalized.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategorySheet {
    name: String,
    /// The header row as loaded, padded with empty headers when rows are wider, used for
    /// write-back.
    headers: Vec<String>,
    mapping: Mapping,
    columns: Columns,
    items: Vec<LineItem>,
}

impl CategorySheet {
    /// Normalizes the raw rows of a sheet (header row first). This never fails: unparsable numbers
    /// become zero, placeholder text becomes empty, absent fields get their defaults, short rows
    /// are padded and fully empty rows are skipped. Cells beyond the header row are kept under
    /// empty headers.
    pub fn normalize<N, S, R, I>(name: N, rows: I) -> Self
    where
        N: Into<String>,
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let name = name.into();
        let mut rows = rows.into_iter();
        let mut headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.into_iter().map(Into::into).collect(),
            None => {
                debug!("Sheet '{name}' is empty");
                return Self {
                    name,
                    ..Self::default()
                };
            }
        };
        let rows: Vec<Vec<String>> = rows
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        // Cells typed past the header row become unnamed columns so that a write-back keeps them.
        let width = rows
            .iter()
            .map(|row| content_width(row))
            .fold(headers.len(), usize::max);
        if width > headers.len() {
            debug!(
                "Sheet '{name}': keeping {} unnamed columns beyond the header row",
                width - headers.len()
            );
            headers.resize(width, String::new());
        }

        let mapping = Mapping::new(headers.iter().map(String::as_str));
        let columns = Columns::resolve(&mapping);
        let layout = field_layout(&columns, width);

        let mut items = Vec::new();
        for mut values in rows {
            if values.iter().all(|v| clean_text(v).is_empty()) {
                continue;
            }
            values.resize(width, String::new());

            let mut item = LineItem::default();
            for (col_ix, value) in values.into_iter().enumerate() {
                match layout[col_ix] {
                    Some(field) => item.set_field(field, &value),
                    None => {
                        let _ = item.other_fields.insert(col_ix, value);
                    }
                }
            }
            items.push(item);
        }

        debug!(
            "Normalized sheet '{name}': {} items, {} of {} fields resolved",
            items.len(),
            columns.iter().count(),
            Field::ALL.len()
        );
        Self {
            name,
            headers,
            mapping,
            columns,
            items,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [LineItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pricing_basis(&self) -> PricingBasis {
        PricingBasis::of(&self.columns)
    }

    /// Renders the sheet as rows for a whole-table write-back, header row first.
    pub fn to_rows(&self, options: SaveOptions) -> Vec<Vec<String>> {
        if self.headers.is_empty() && self.items.is_empty() {
            return Vec::new();
        }

        let mut headers = self.headers.clone();
        let mut layout = field_layout(&self.columns, headers.len());
        if options.structure_edit {
            for field in self.pricing_basis().addable(&self.columns) {
                debug!(
                    "Adding column '{}' to sheet '{}'",
                    field.canonical_header(),
                    self.name
                );
                headers.push(field.canonical_header().to_string());
                layout.push(Some(field));
            }
        }

        let mut rows = Vec::with_capacity(self.items.len() + 1);
        rows.push(headers);
        for item in &self.items {
            let row = layout
                .iter()
                .enumerate()
                .map(|(col_ix, field)| match field {
                    Some(field) => item.get_field(*field),
                    None => item.other_fields.get(&col_ix).cloned().unwrap_or_default(),
                })
                .collect();
            rows.push(row);
        }
        rows
    }
}

/// The number of cells up to and including the last one holding any text.
fn content_width(row: &[String]) -> usize {
    row.iter()
        .rposition(|v| !v.trim().is_empty())
        .map_or(0, |ix| ix + 1)
}

/// For each column position, the field stored there (if any).
fn field_layout(columns: &Columns, width: usize) -> Vec<Option<Field>> {
    let mut layout = vec![None; width];
    for (field, column) in columns.iter() {
        if let Some(slot) = layout.get_mut(column.index()) {
            *slot = Some(field);
        }
    }
    layout
}
