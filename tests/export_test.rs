mod common;

use anyhow::Result;
use common::{parse_date, record_chain, supplier_entry, test_service};
use khata::domain::{LedgerFilter, PartyType};
use khata::io::Exporter;

#[tokio::test]
async fn test_export_ledger_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .record_entry(
            supplier_entry("S-1", "Acme, Traders", 150050, 0)
                .with_date(parse_date("2024-01-10"))
                .with_payment_method("neft")
                .with_due_date(parse_date("2024-02-10")),
        )
        .await?;
    service
        .record_entry(supplier_entry("S-1", "Acme, Traders", 0, 50).with_date(parse_date("2024-01-12")))
        .await?;
    record_chain(&service, PartyType::Customer, "C-1", &[(0, 100)]).await?;

    let mut buffer = Vec::new();
    let rows = Exporter::new(&service)
        .export_ledger_csv(PartyType::Supplier, &LedgerFilter::default(), &mut buffer)
        .await?;
    assert_eq!(rows, 2);

    let csv = String::from_utf8(buffer)?;
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "date,party_id,party_name,mobile_number,type,reference_no,payment_method,debit,credit,balance,due_date"
    );
    assert_eq!(
        lines[1],
        "2024-01-12,S-1,\"Acme, Traders\",,Purchase,PUR0001,,0.50,0.00,1500.00,"
    );
    assert_eq!(
        lines[2],
        "2024-01-10,S-1,\"Acme, Traders\",,Purchase,PUR0001,Bank Transfer,0.00,1500.50,1500.50,2024-02-10"
    );

    Ok(())
}

#[tokio::test]
async fn test_export_respects_filter_and_ignores_paging() -> Result<()> {
    let (service, _temp) = test_service().await?;

    record_chain(&service, PartyType::Customer, "C-1", &[(0, 100), (0, 100), (0, 100)]).await?;
    record_chain(&service, PartyType::Customer, "C-2", &[(0, 100)]).await?;

    let mut buffer = Vec::new();
    let filter = LedgerFilter {
        search: Some("c-1".into()),
        page: Some(3),
        limit: Some(1),
        ..Default::default()
    };
    let rows = Exporter::new(&service)
        .export_ledger_csv(PartyType::Customer, &filter, &mut buffer)
        .await?;

    assert_eq!(rows, 3);
    assert_eq!(String::from_utf8(buffer)?.lines().count(), 4);

    Ok(())
}
