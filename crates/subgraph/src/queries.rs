//! GraphQL query documents for the mosaic subgraphs.
//!
//! Each bridged chain is indexed by its own subgraph with its own entity
//! set: the origin subgraph carries the composer and gateway collections,
//! the auxiliary subgraph the redeem pool and co-gateway collections. One
//! document is built per entity, filtered by `blockNumber_gt` so the poll
//! loop only fetches records it has not seen, ordered ascending so the
//! cursor can advance past the last record of a page.

use facilitator_core::ports::ChainTag;

/// One pollable entity collection with its prepared query document.
pub(crate) struct EntityQuery {
    /// Collection field name; doubles as the event-type key handlers are
    /// registered under.
    pub entity: &'static str,
    /// Full GraphQL document, parameterized by `$fromBlock` and `$first`.
    pub document: String,
}

// Selection sets mirror the event payloads the handlers decode. Gateway and
// co-gateway events prefix their log parameters with an underscore; the
// composer and redeem-pool collections use plain camelCase.
const ORIGIN_ENTITIES: &[(&str, &[&str])] = &[
    (
        "stakeRequesteds",
        &[
            "stakeRequestHash",
            "amount",
            "beneficiary",
            "gasPrice",
            "gasLimit",
            "nonce",
            "gateway",
            "staker",
            "stakerProxy",
            "blockNumber",
        ],
    ),
    (
        "stakeIntentDeclareds",
        &[
            "_messageHash",
            "_staker",
            "_stakerNonce",
            "_beneficiary",
            "_amount",
            "contractAddress",
            "blockNumber",
        ],
    ),
    (
        "stakeProgresseds",
        &[
            "_messageHash",
            "_staker",
            "_stakerNonce",
            "_amount",
            "_unlockSecret",
            "contractAddress",
            "blockNumber",
        ],
    ),
    (
        "redeemIntentConfirmeds",
        &[
            "_messageHash",
            "_redeemer",
            "_redeemerNonce",
            "contractAddress",
            "blockNumber",
        ],
    ),
    (
        "unstakeProgresseds",
        &[
            "_messageHash",
            "_redeemer",
            "_redeemerNonce",
            "_unlockSecret",
            "contractAddress",
            "blockNumber",
        ],
    ),
];

const AUXILIARY_ENTITIES: &[(&str, &[&str])] = &[
    (
        "redeemRequesteds",
        &[
            "redeemRequestHash",
            "amount",
            "beneficiary",
            "gasPrice",
            "gasLimit",
            "nonce",
            "cogateway",
            "redeemer",
            "redeemerProxy",
            "blockNumber",
        ],
    ),
    (
        "redeemIntentDeclareds",
        &[
            "_messageHash",
            "_redeemer",
            "_redeemerNonce",
            "_beneficiary",
            "_amount",
            "contractAddress",
            "blockNumber",
        ],
    ),
    (
        "redeemProgresseds",
        &[
            "_messageHash",
            "_redeemer",
            "_redeemerNonce",
            "_amount",
            "_unlockSecret",
            "contractAddress",
            "blockNumber",
        ],
    ),
    (
        "stakeIntentConfirmeds",
        &[
            "_messageHash",
            "_staker",
            "_stakerNonce",
            "contractAddress",
            "blockNumber",
        ],
    ),
    (
        "mintProgresseds",
        &[
            "_messageHash",
            "_staker",
            "_stakerNonce",
            "_unlockSecret",
            "contractAddress",
            "blockNumber",
        ],
    ),
];

fn tracked_entities(chain: ChainTag) -> &'static [(&'static str, &'static [&'static str])] {
    match chain {
        ChainTag::Origin => ORIGIN_ENTITIES,
        ChainTag::Auxiliary => AUXILIARY_ENTITIES,
    }
}

/// Build the prepared queries for every entity indexed on `chain`.
pub(crate) fn entity_queries(chain: ChainTag) -> Vec<EntityQuery> {
    tracked_entities(chain)
        .iter()
        .map(|(entity, fields)| EntityQuery {
            entity,
            document: build_document(entity, fields),
        })
        .collect()
}

/// Render one collection query with a cursor filter and ascending block
/// order.
fn build_document(entity: &str, fields: &[&str]) -> String {
    let selection = fields.join("\n        ");
    format!(
        r#"query ($fromBlock: BigInt!, $first: Int!) {{
    {entity}(
        first: $first
        orderBy: blockNumber
        orderDirection: asc
        where: {{ blockNumber_gt: $fromBlock }}
    ) {{
        id
        {selection}
    }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_document_filters_and_orders_by_block_number() {
        for chain in [ChainTag::Origin, ChainTag::Auxiliary] {
            for query in entity_queries(chain) {
                assert!(query.document.contains("blockNumber_gt: $fromBlock"));
                assert!(query.document.contains("orderBy: blockNumber"));
                assert!(query.document.contains("orderDirection: asc"));
                assert!(query.document.contains(query.entity));
            }
        }
    }

    // Le curseur avance sur blockNumber: chaque sélection doit le demander.
    #[test]
    fn every_selection_set_includes_block_number() {
        for (_, fields) in ORIGIN_ENTITIES.iter().chain(AUXILIARY_ENTITIES) {
            assert!(fields.contains(&"blockNumber"));
        }
    }

    #[test]
    fn chains_cover_all_ten_entities_without_overlap() {
        let origin: Vec<&str> = ORIGIN_ENTITIES.iter().map(|(e, _)| *e).collect();
        let auxiliary: Vec<&str> = AUXILIARY_ENTITIES.iter().map(|(e, _)| *e).collect();

        assert_eq!(origin.len() + auxiliary.len(), 10);
        for entity in &origin {
            assert!(!auxiliary.contains(entity), "{entity} indexed on both chains");
        }
    }

    #[test]
    fn request_collections_expose_their_request_hash() {
        let stake = entity_queries(ChainTag::Origin)
            .into_iter()
            .find(|q| q.entity == "stakeRequesteds")
            .unwrap();
        assert!(stake.document.contains("stakeRequestHash"));

        let redeem = entity_queries(ChainTag::Auxiliary)
            .into_iter()
            .find(|q| q.entity == "redeemRequesteds")
            .unwrap();
        assert!(redeem.document.contains("redeemRequestHash"));
        assert!(redeem.document.contains("cogateway"));
    }
}
