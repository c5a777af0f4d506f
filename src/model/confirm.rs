use crate::model::{CategorySheet, Field, LineItem};

/// Flag values that mark a purchase as confirmed. `1` is accepted because some older sheets
/// encode the flag numerically.
pub const CONFIRMED_FLAGS: &[&str] = &["S", "1"];

/// Whether a flag cell marks its row as confirmed. Comparison is on the trimmed, uppercased
/// value.
pub fn is_confirmed(flag: &str) -> bool {
    let flag = flag.trim().to_uppercase();
    CONFIRMED_FLAGS.iter().any(|f| *f == flag)
}

impl LineItem {
    pub fn is_confirmed(&self) -> bool {
        is_confirmed(self.flag())
    }
}

/// Splits the rows of `sheet` into `(confirmed, pending)`, preserving row order. A sheet without
/// a flag column has no confirmed rows.
pub fn partition(sheet: &CategorySheet) -> (Vec<&LineItem>, Vec<&LineItem>) {
    if !sheet.columns().contains(Field::Confirmed) {
        return (Vec::new(), sheet.items().iter().collect());
    }
    sheet.items().iter().partition(|item| item.is_confirmed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_confirmed() {
        assert!(is_confirmed("S"));
        assert!(is_confirmed(" s "));
        assert!(is_confirmed("1"));
        assert!(!is_confirmed("N"));
        assert!(!is_confirmed(""));
        assert!(!is_confirmed("Si"));
        assert!(!is_confirmed("0"));
    }

    #[test]
    fn test_partition_preserves_order() {
        let sheet = CategorySheet::normalize(
            "camera",
            vec![
                vec!["Articolo", "Costo", "Acquista S/N"],
                vec!["Letto", "800", "S"],
                vec!["Armadio", "1200", "N"],
                vec!["Comodino", "120", "1"],
                vec!["Specchio", "90", ""],
            ],
        );
        let (confirmed, pending) = partition(&sheet);
        let names = |items: &[&LineItem]| -> Vec<String> {
            items.iter().map(|i| i.description().to_string()).collect()
        };
        assert_eq!(names(&confirmed), vec!["Letto", "Comodino"]);
        assert_eq!(names(&pending), vec!["Armadio", "Specchio"]);
    }

    #[test]
    fn test_partition_without_flag_column() {
        let sheet = CategorySheet::normalize(
            "lavori",
            vec![vec!["Oggetto", "Totale"], vec!["Pittura", "900"]],
        );
        let (confirmed, pending) = partition(&sheet);
        assert!(confirmed.is_empty());
        assert_eq!(pending.len(), 1);
    }
}
