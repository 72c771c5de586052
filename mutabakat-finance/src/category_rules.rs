//! Deterministic category and operation rules for statement records.
//!
//! Every table is first-match-wins; row order is the priority. Patterns run
//! against folded text (see [`mutabakat_core::fold`]), so they are written in
//! lowercase with a plain `i`.

use mutabakat_core::{
    Category, Channel, EnrichedTransaction, Operation, ParsedRecord, RuleTable, Subcategory,
    TransferDirection, fold,
};
use mutabakat_ingest::description::extract_counterparty;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::quality::content_hash;

/// Result of categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub subcategory: Subcategory,
}

const fn class(category: Category, subcategory: Subcategory) -> Classification {
    Classification {
        category,
        subcategory,
    }
}

static CATEGORY_RULES: Lazy<RuleTable<Classification>> = Lazy::new(|| {
    RuleTable::from_rows([
        (r"\bbsmv\b", class(Category::Fee, Subcategory::FeeBsmv)),
        (
            r"elektronik\s+fon\s+transferi.*ücret",
            class(Category::Fee, Subcategory::FeeEft),
        ),
        (
            r"\bgelen\s+(?:fast|eft|havale)\b",
            class(Category::Incoming, Subcategory::IncomingTransfer),
        ),
        (
            r"\bgiden\s+(?:fast|eft|havale)\b",
            class(Category::Outgoing, Subcategory::OutgoingTransfer),
        ),
        (r"\bpos\b", class(Category::Pos, Subcategory::PosPurchase)),
        (
            r"fatura|elektrik|enerji|doğal\s*gaz|dogalgaz|\bsu\b|telekom|turkcell|vodafone|superonline|\binternet\b",
            class(Category::Utility, Subcategory::UtilityBill),
        ),
    ])
    .expect("invalid category rules")
});

static OPERATION_RULES: Lazy<RuleTable<Operation>> = Lazy::new(|| {
    RuleTable::from_rows([
        (r"\bfast\b", Operation::Fast),
        (r"\beft\b", Operation::Eft),
        (r"\bhavale\b", Operation::Havale),
        (r"\bpos\b", Operation::Pos),
        (r"\bfatura", Operation::Fatura),
        (r"\bpara\s+gönder", Operation::ParaGonder),
    ])
    .expect("invalid operation rules")
});

static CHANNEL_RULES: Lazy<RuleTable<Channel>> = Lazy::new(|| {
    RuleTable::from_rows([
        (r"internet\s*-\s*mobil", Channel::InternetMobil),
        (r"\bdiğer\b", Channel::Diger),
        (r"\bşube\b", Channel::Sube),
    ])
    .expect("invalid channel rules")
});

static DIRECTION_RULES: Lazy<RuleTable<TransferDirection>> = Lazy::new(|| {
    RuleTable::from_rows([
        (r"\bgelen\b", TransferDirection::Gelen),
        (r"\bgiden\b", TransferDirection::Giden),
    ])
    .expect("invalid direction rules")
});

/// Categorize a normalized description.
pub fn categorize(description: &str) -> Classification {
    CATEGORY_RULES
        .first_match(&fold(description))
        .copied()
        .unwrap_or(class(Category::Other, Subcategory::Other))
}

/// Operation, channel and direction tags of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub op: Option<Operation>,
    pub channel: Channel,
    pub direction: Option<TransferDirection>,
}

/// Tag a record's text. Run on the raw record text, since description
/// normalization strips the channel boilerplate this looks for.
pub fn operation_info(text: &str) -> OperationInfo {
    let folded = fold(text);
    OperationInfo {
        op: OPERATION_RULES.first_match(&folded).copied(),
        channel: CHANNEL_RULES.first_match(&folded).copied().unwrap_or_default(),
        direction: DIRECTION_RULES.first_match(&folded).copied(),
    }
}

/// Enrich a parsed record. Confidence starts at 1.0 with no anomalies;
/// quality checks apply penalties afterwards.
pub fn enrich(record: ParsedRecord) -> EnrichedTransaction {
    let classification = categorize(&record.description);
    let info = operation_info(&record.raw);
    let counterparty = extract_counterparty(&record.description);
    let (debit, credit) = EnrichedTransaction::split_amount(record.amount);
    let hash = content_hash(&record);

    EnrichedTransaction {
        record,
        debit,
        credit,
        category: classification.category,
        subcategory: classification.subcategory,
        op: info.op,
        channel: info.channel,
        direction: info.direction,
        counterparty_name: counterparty.name,
        counterparty_iban: counterparty.iban,
        confidence: 1.0,
        anomalies: Vec::new(),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_category_priority() {
        // BSMV outranks the EFT fee rule it usually appears with
        let c = categorize("Elektronik Fon Transferi Ücreti BSMV");
        assert_eq!(c.subcategory, Subcategory::FeeBsmv);

        let c = categorize("ELEKTRONİK FON TRANSFERİ İŞLEM ÜCRETİ");
        assert_eq!(c, class(Category::Fee, Subcategory::FeeEft));

        assert_eq!(categorize("GELEN FAST - AHMET").category, Category::Incoming);
        assert_eq!(categorize("GİDEN HAVALE - AYŞE").category, Category::Outgoing);
        assert_eq!(categorize("POS MİGROS").subcategory, Subcategory::PosPurchase);
        assert_eq!(categorize("Elektrik faturası").category, Category::Utility);
        assert_eq!(categorize("Kira").category, Category::Other);
    }

    #[test]
    fn test_transfer_fee_line_is_not_a_transfer() {
        // "gelen eft" would match incoming; the fee rule sits above it
        let c = categorize("Gelen EFT BSMV");
        assert_eq!(c.category, Category::Fee);
    }

    #[test]
    fn test_operation_priority() {
        assert_eq!(operation_info("Fatura FAST ödemesi").op, Some(Operation::Fast));
        assert_eq!(operation_info("EFT HAVALE").op, Some(Operation::Eft));
        assert_eq!(operation_info("Fatura Türk Telekom").op, Some(Operation::Fatura));
        assert_eq!(operation_info("Para Gönder").op, Some(Operation::ParaGonder));
        assert_eq!(operation_info("Kira").op, None);
    }

    #[test]
    fn test_channel_and_direction() {
        let info = operation_info("Internet - Mobil GİDEN FAST");
        assert_eq!(info.channel, Channel::InternetMobil);
        assert_eq!(info.direction, Some(TransferDirection::Giden));

        let info = operation_info("ŞUBE GELEN HAVALE");
        assert_eq!(info.channel, Channel::Sube);
        assert_eq!(info.direction, Some(TransferDirection::Gelen));

        let info = operation_info("market alışverişi");
        assert_eq!(info.channel, Channel::Diger);
        assert_eq!(info.direction, None);
    }

    #[test]
    fn test_enrich_sets_sides_and_counterparty() {
        let record = ParsedRecord {
            line_number: 3,
            date_time: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(14, 22, 1)
                .unwrap(),
            description: "GİDEN FAST - AHMET YILMAZ - Kira".to_string(),
            amount: -1250.0,
            currency: "TL".to_string(),
            balance: 3750.5,
            balance_currency: "TL".to_string(),
            raw: "12/03/2024 14:22:01 Internet - Mobil GİDEN FAST - AHMET YILMAZ - Kira -1.250,00 TL 3.750,50 TL"
                .to_string(),
        };
        let tx = enrich(record);
        assert_eq!((tx.debit, tx.credit), (1250.0, 0.0));
        assert_eq!(tx.category, Category::Outgoing);
        assert_eq!(tx.op, Some(Operation::Fast));
        assert_eq!(tx.channel, Channel::InternetMobil);
        assert_eq!(tx.counterparty_name.as_deref(), Some("AHMET YILMAZ"));
        assert_eq!(tx.confidence, 1.0);
        assert_eq!(tx.hash.len(), 64);
        assert_eq!(tx.id().len(), 16);
    }
}
