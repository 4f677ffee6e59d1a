#[cfg(test)]
mod tests {
    use ingredients::ingredient_parser::{consume_quantity, parse, parse_ingredient_block};
    use ingredients::text_processing::{normalize_for_matching, split_top_level_or};

    #[test]
    fn test_scenario_simple_volume() {
        let result = parse("2 cups flour");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("cups"));
        assert_eq!(result.name, "flour");
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_scenario_fraction() {
        let result = parse("1/2 tsp salt");
        assert_eq!(result.quantity_amount, Some(0.5));
        assert_eq!(result.quantity_unit.as_deref(), Some("tsp"));
        assert_eq!(result.name, "salt");
    }

    #[test]
    fn test_scenario_or_pattern() {
        let result = parse("2 jalapeños or fresno chiles");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_unit, None);
        assert_eq!(result.name, "jalapeños");
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].name, "fresno chiles");
    }

    #[test]
    fn test_raw_text_is_preserved_verbatim() {
        let raw = "  2   Cups  Flour,  sifted ";
        let result = parse(raw);
        assert_eq!(result.raw_text, raw);
        assert_eq!(result.name, "flour");
        assert_eq!(result.display_name, "Flour");
        assert_eq!(result.preparation.as_deref(), Some("sifted"));
    }

    #[test]
    fn test_alternatives_only_with_disjunction() {
        for line in ["2 cups orange juice", "1 cup flour, sifted", "salt and pepper", "4 oranges"] {
            let result = parse(line);
            assert!(
                result.alternatives.is_empty(),
                "'{}' should have no alternatives",
                line
            );
        }
        assert_eq!(parse("butter or margarine").alternatives.len(), 1);
        assert_eq!(parse("1 cup milk, cream or half-and-half").alternatives.len(), 0);
    }

    #[test]
    fn test_three_way_or_pattern() {
        let result = parse("1 cup red, white or yellow onion");
        // The comma splits off "white or yellow onion" as preparation
        assert_eq!(result.name, "red");
        assert_eq!(result.preparation.as_deref(), Some("white or yellow onion"));

        let result = parse("1 tsp basil or oregano or thyme");
        assert_eq!(result.name, "basil");
        let alternatives: Vec<&str> = result.alternatives.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(alternatives, vec!["oregano", "thyme"]);
    }

    #[test]
    fn test_quantity_forms() {
        let cases = [
            ("3 eggs", 3.0),
            ("1.5 cups water", 1.5),
            ("2,5 kg potatoes", 2.5),
            ("¾ cup sugar", 0.75),
            ("1½ cups milk", 1.5),
            ("1 1/2 cups milk", 1.5),
            ("1⁄3 cup oil", 1.0 / 3.0),
            ("⅛ tsp nutmeg", 0.125),
        ];
        for (line, expected) in cases {
            let amount = parse(line).quantity_amount.expect(line);
            assert!((amount - expected).abs() < 1e-9, "{} -> {}", line, amount);
        }
    }

    #[test]
    fn test_range_takes_lower_bound() {
        let result = parse("3-2 cloves garlic");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_range_max, Some(3.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("cloves"));

        let result = parse("2 – 3 tbsp honey");
        assert_eq!(result.quantity_amount, Some(2.0));

        let result = parse("1½-2 cups stock");
        assert_eq!(result.quantity_amount, Some(1.5));
        assert_eq!(result.quantity_range_max, Some(2.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("cups"));
        assert_eq!(result.name, "stock");

        let result = parse("1 1/2-2 cups stock");
        assert_eq!(result.quantity_amount, Some(1.5));
        assert_eq!(result.quantity_unit.as_deref(), Some("cups"));
        assert_eq!(result.name, "stock");
    }

    #[test]
    fn test_quantity_disjunction_keeps_unit() {
        let result = parse("2 or 3 cloves garlic");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_range_max, Some(3.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("cloves"));
        assert_eq!(result.name, "garlic");
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_unknown_unit_stays_in_name() {
        let result = parse("2 smidgens saffron");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_unit, None);
        assert_eq!(result.name, "smidgens saffron");
    }

    #[test]
    fn test_qualifiers() {
        let result = parse("pepper, to taste");
        assert_eq!(result.name, "pepper");
        assert_eq!(result.preparation.as_deref(), Some("to taste"));

        let result = parse("fresh parsley for garnish");
        assert_eq!(result.name, "fresh parsley");
        assert_eq!(result.qualifier.as_deref(), Some("for garnish"));
    }

    #[test]
    fn test_block_preserves_order() {
        let parsed = parse_ingredient_block("  \n3 eggs\n  1 cup milk  \n\n2 tbsp butter\n");
        let names: Vec<&str> = parsed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["eggs", "milk", "butter"]);
    }

    #[test]
    fn test_consume_quantity_reports_rest() {
        let token = consume_quantity("2 1/4 cups flour").unwrap();
        assert!((token.amount - 2.25).abs() < 1e-9);
        assert_eq!(token.rest, "cups flour");
        assert!(consume_quantity("flour").is_none());
    }

    #[test]
    fn test_normalization_for_matching() {
        assert_eq!(normalize_for_matching("Crème Fraîche"), "creme fraiche");
        assert_eq!(normalize_for_matching("Cherry Tomatoes"), "cherry tomato");
        assert_eq!(normalize_for_matching("Blueberries"), "blueberry");
        assert_eq!(split_top_level_or("x and/or y").len(), 2);
    }
}
