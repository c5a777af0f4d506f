//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a data directory. The seed data is also what `arredo init --seed`
//! writes.

use crate::api::{parse_csv, Sheet};
use crate::error::LoadError;
use crate::Result;
use anyhow::Context;
use std::collections::HashMap;

/// An implementation of the `Sheet` trait that keeps every sheet in memory. It can hold any data
/// and, via `seeded`, starts out with the demo rooms.
#[derive(Debug, Default, Clone)]
pub(crate) struct TestSheet {
    pub(crate) data: HashMap<String, Vec<Vec<String>>>,
    /// Sheets whose `get` fails as if the store were unreachable.
    pub(crate) broken: Vec<String>,
}

impl TestSheet {
    /// Create a new `TestSheet` using `data`. The map key is sheet name and the map value is the
    /// rows of the sheet.
    pub(crate) fn new(data: HashMap<String, Vec<Vec<String>>>) -> Self {
        Self {
            data,
            broken: Vec::new(),
        }
    }

    /// Create a `TestSheet` holding the seed data from this module.
    pub(crate) fn seeded() -> Result<Self> {
        Ok(Self::new(seed_data()?.into_iter().map(|(k, v)| (k.to_string(), v)).collect()))
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, sheet_name: &str) -> std::result::Result<Vec<Vec<String>>, LoadError> {
        if self.broken.iter().any(|b| b == sheet_name) {
            return Err(LoadError::Transport {
                sheet: sheet_name.to_string(),
                source: "connection reset".into(),
            });
        }
        self.data
            .get(sheet_name)
            .cloned()
            .ok_or_else(|| LoadError::Missing {
                sheet: sheet_name.to_string(),
            })
    }

    async fn put(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Result<()> {
        self.data.insert(sheet_name.to_string(), rows.to_vec());
        Ok(())
    }
}

/// The demo sheets, in the order they are listed in a new configuration, settings sheet last.
pub(crate) fn seed_data() -> Result<Vec<(&'static str, Vec<Vec<String>>)>> {
    SEEDS
        .iter()
        .map(|(name, csv)| {
            parse_csv(csv.as_bytes())
                .with_context(|| format!("Bad seed data for sheet '{name}'"))
                .map(|rows| (*name, rows))
        })
        .collect()
}

const SEEDS: &[(&str, &str)] = &[
    ("camera", CAMERA),
    ("cucina", CUCINA),
    ("salotto", SALOTTO),
    ("tavolo", TAVOLO),
    ("lavori", LAVORI),
    ("Impostazioni", IMPOSTAZIONI),
];

/// An older sheet that stores totals only.
const CAMERA: &str = r##"Articolo,Costo,S/N,Stato,Pagato,Link,Note
Letto matrimoniale,"1.290,00",S,Saldato,"1.290,00",https://fatture.example.com/2026/0142,
Armadio 6 ante,"1.850,00",S,Acconto,500,,consegna aprile
Comodini (coppia),240,N,,,,
Specchio,None,N,nan,,,
"##;

const CUCINA: &str = r##"Oggetto,Prezzo Listino,Sconto %,Quantità,Costo Unitario,Importo Totale,Acquista S/N,Stato Pagamento,Importo Pagato,Scadenza,Link Fattura
Forno,649.00,10,1,584.10,584.10,S,Saldato,584.10,2026-02-15,
Piano cottura induzione,520,15%,1,442.00,442.00,S,Acconto,200,15/03/2026,
Sgabelli,89.90,,4,89.90,359.60,N,,0,,
Lavastoviglie,0,,1,480,480.00,S,Ordinato,0,,
"##;

const SALOTTO: &str = r##" Oggetto ,Listino,Sconto,Qtà,Prezzo Unitario,Totale,Scelta,Pagamento,Versato,Annotazioni
Divano 3 posti,"1.890,00",20,1,1512.00,1512.00,s,Saldato,1512.00,
Tavolino,180,,1,180.00,180.00,1,,0,
Tappeto,350,10,1,315.00,315.00,N,Preventivo,0,in attesa di campione
Lampada da terra,129,,2,129.00,258.00,S,Acconto,100,
"##;

const TAVOLO: &str = r##"Nome,Prezzo di Listino,Sconto (%),Pezzi,Costo Unitario,Importo Totale,Acquistato,Stato Pagamento,Importo Pagato
Tavolo allungabile,"1.250,00","12,5",1,1093.75,1093.75,S,Saldato,1093.75
Sedie,149.90,,6,149.90,899.40,S,Acconto,300.00
Tovaglia,45,,1,45.00,45.00,N,,0
"##;

/// Works priced as a whole.
const LAVORI: &str = r##"Descrizione,Prezzo,Acquista S/N,Stato Pagamento,Importo Pagato,Data Pagamento
Tinteggiatura,"2.400,00",S,Acconto,"1.000,00",30/04/2026
Impianto elettrico,"3.150,00",S,Preventivo,0,
Parquet,"4.800,00",N,,,
"##;

const IMPOSTAZIONI: &str = r##"Chiave,Valore
Budget Totale,"18.000,00"
Valuta,EUR
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_data_parses() {
        let seeds = seed_data().unwrap();
        let names: Vec<&str> = seeds.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["camera", "cucina", "salotto", "tavolo", "lavori", "Impostazioni"]
        );
        for (name, rows) in &seeds {
            let width = rows[0].len();
            assert!(rows.iter().all(|r| r.len() == width), "{name}");
        }
    }

    #[tokio::test]
    async fn test_get_and_put() {
        let mut sheet = TestSheet::seeded().unwrap();
        let camera = sheet.get("camera").await.unwrap();
        assert_eq!(camera[1][0], "Letto matrimoniale");

        sheet.put("bagno", &[vec!["Oggetto".to_string()]]).await.unwrap();
        assert_eq!(sheet.get("bagno").await.unwrap().len(), 1);
        assert!(sheet.get("garage").await.unwrap_err().is_missing());
    }

    #[tokio::test]
    async fn test_broken_sheet() {
        let mut sheet = TestSheet::seeded().unwrap();
        sheet.broken.push("cucina".to_string());
        let err = sheet.get("cucina").await.unwrap_err();
        assert!(matches!(err, LoadError::Transport { .. }));
    }
}
