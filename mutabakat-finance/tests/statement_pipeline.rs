use mutabakat_core::{Category, Channel, Operation, Subcategory, TransferDirection};
use mutabakat_finance::statement::{parse_statement, parse_statement_file};
use mutabakat_ingest::{StatementError, StatementLayout};
use std::io::Write;

const IBAN: &str = "TR120006200000000123456789";

fn sample_statement() -> String {
    format!(
        "ÖRNEK BANKASI A.Ş.
Hesap Hareketleri
Müşteri Adı: AYŞE KAYA
IBAN/Hesap No: TR12 0006 2000 0000 0123 4567 89
Tarih Aralığı: 01/03/2024 - 31/03/2024
TarihAçıklamaTutarBakiye
01/03/2024 09:15:00 Şube GELEN HAVALE - MEHMET DEMİR - Ki-
ra ödemesi 5.000,00 TL 5.000,00 TL
02/03/2024 10:00:00 Internet - Mobil GİDEN FAST - AHMET YILMAZ {IBAN}
20240302000012345 -1.250,00 TL 3.750,00 TL
02/03/2024 10:00:01 Elektronik Fon Transferi Ücreti -4,00 TL 3.746,00 TL
02/03/2024 10:00:02 BSMV -0,20 TL 3.745,80 TL
1/2
05/03/2024 18:45:10 POS MİGROS KADIKÖY -312,45 TL 3.433,35 TL
06/03/2024 08:00:00 Fatura - TÜRK TELEKOM -199,90 TL 3.233,45 TL
06/03/2024 08:30:00 açıklamasız satır
"
    )
}

#[test]
fn test_full_statement() {
    let result = parse_statement(&sample_statement()).unwrap();

    assert_eq!(result.transactions.len(), 6);
    assert_eq!(result.quality.rejected_rows.len(), 1);
    assert!(result.quality.balance_anomalies.is_empty());
    assert!(result.quality.duplicate_hashes.is_empty());

    let info = &result.account_info;
    assert_eq!(info.account_holder.as_deref(), Some("AYŞE KAYA"));
    assert_eq!(info.iban.as_deref(), Some(IBAN));
    assert_eq!(info.end_balance, Some(3233.45));

    let incoming = &result.transactions[0];
    assert_eq!(incoming.category, Category::Incoming);
    assert_eq!(incoming.op, Some(Operation::Havale));
    assert_eq!(incoming.channel, Channel::Sube);
    assert_eq!(incoming.direction, Some(TransferDirection::Gelen));
    assert_eq!(incoming.counterparty_name.as_deref(), Some("MEHMET DEMİR"));
    assert!(incoming.record.description.contains("Kira ödemesi"));

    let outgoing = &result.transactions[1];
    assert_eq!(outgoing.debit, 1250.0);
    assert_eq!(outgoing.channel, Channel::InternetMobil);
    assert_eq!(outgoing.counterparty_iban.as_deref(), Some(IBAN));
    assert_eq!(outgoing.counterparty_name.as_deref(), Some("AHMET YILMAZ"));
    assert!(!outgoing.record.description.contains("20240302000012345"));

    assert_eq!(result.transactions[2].subcategory, Subcategory::FeeEft);
    assert_eq!(result.transactions[3].subcategory, Subcategory::FeeBsmv);
    assert_eq!(result.transactions[4].category, Category::Pos);
    assert_eq!(result.transactions[5].category, Category::Utility);

    let summary = &result.summary;
    assert_eq!(summary.transaction_count, 6);
    assert_eq!(summary.rejected_count, 1);
    assert_eq!(summary.anomaly_count, 0);
    assert_eq!(summary.total_credit, 5000.0);
    assert_eq!(summary.total_debit, 1766.55);
    assert_eq!(summary.by_category[&Category::Fee], 2);
}

#[test]
fn test_reparse_is_deterministic() {
    let a = parse_statement(&sample_statement()).unwrap();
    let b = parse_statement(&sample_statement()).unwrap();
    let ids_a: Vec<&str> = a.transactions.iter().map(|t| t.id()).collect();
    let ids_b: Vec<&str> = b.transactions.iter().map(|t| t.id()).collect();
    assert_eq!(ids_a, ids_b);
    // no cross-call state: a second parse finds no duplicates
    assert!(b.quality.duplicate_hashes.is_empty());
}

#[test]
fn test_repeated_row_is_kept_and_flagged() {
    let text = "Hesap Hareketleri
01/03/2024 09:00:00 POS MARKET -10,00 TL 90,00 TL
01/03/2024 09:00:00 POS MARKET -10,00 TL 90,00 TL
";
    let result = parse_statement(text).unwrap();
    assert_eq!(result.transactions.len(), 2);
    assert_eq!(result.quality.duplicate_hashes.len(), 1);
    assert_eq!(result.quality.balance_anomalies.len(), 1);

    let second = &result.transactions[1];
    assert!((second.confidence - 0.4).abs() < 1e-9);
    assert_eq!(second.anomalies.len(), 2);
    assert_eq!(result.summary.anomaly_count, 1);
}

#[test]
fn test_empty_and_unreadable_inputs() {
    assert!(matches!(parse_statement(""), Err(StatementError::Empty)));
    assert!(matches!(
        parse_statement_file("/no/such/statement.txt"),
        Err(StatementError::Read { .. })
    ));
}

#[test]
fn test_statement_from_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(sample_statement().as_bytes()).unwrap();
    let result = parse_statement_file(f.path()).unwrap();
    assert_eq!(result.transactions.len(), 6);
    assert_eq!(
        StatementLayout::detect(&sample_statement()),
        StatementLayout::TimestampedRows
    );
}
