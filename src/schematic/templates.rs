//! Source of the files generated for an ngrx feature, before enhancement.
//!
//! Actions, reducer and effects start as the stock `@ngrx` 5.x feature
//! scaffold; the ngrx flow then rewrites them with the planners. The
//! remaining files are generated in their final form.

use super::names::Names;

/// File suffixes of a feature, in generation order.
pub const FEATURE_SUFFIXES: &[&str] = &[
    "actions.ts",
    "reducer.ts",
    "reducer.spec.ts",
    "effects.ts",
    "effects.spec.ts",
    "init.ts",
    "interfaces.ts",
];

/// `(file name, content)` for every feature file of `names`.
pub fn feature_files(names: &Names) -> Vec<(String, String)> {
    FEATURE_SUFFIXES
        .iter()
        .map(|suffix| {
            let content = match *suffix {
                "actions.ts" => actions(names),
                "reducer.ts" => reducer(names),
                "reducer.spec.ts" => reducer_spec(names),
                "effects.ts" => effects(names),
                "effects.spec.ts" => effects_spec(names),
                "init.ts" => init(names),
                _ => interfaces(names),
            };
            (format!("{}.{}", names.file_name, suffix), content)
        })
        .collect()
}

fn actions(n: &Names) -> String {
    let c = &n.class_name;
    format!(
        r#"import {{ Action }} from '@ngrx/store';

export enum {c}ActionTypes {{
  {c}Action = '[{c}] Action'
}}

export class {c} implements Action {{
  readonly type = {c}ActionTypes.{c}Action;
}}

export type {c}Actions = {c};
"#
    )
}

fn reducer(n: &Names) -> String {
    let c = &n.class_name;
    let f = &n.file_name;
    format!(
        r#"import {{ Action }} from '@ngrx/store';
import {{ {c}Actions, {c}ActionTypes }} from './{f}.actions';

export interface State {{

}}

export const initialState = {{

}};

export function reducer(state = initialState, action: {c}Actions): State {{
  switch (action.type) {{

    case {c}ActionTypes.{c}Action:
      return state;


    default:
      return state;
  }}
}}
"#
    )
}

fn reducer_spec(n: &Names) -> String {
    let c = &n.class_name;
    let p = &n.property_name;
    let f = &n.file_name;
    format!(
        r#"import {{ {p}Reducer }} from './{f}.reducer';
import {{ {p}InitialState }} from './{f}.init';
import {{ {c} }} from './{f}.interfaces';
import {{ DataLoaded }} from './{f}.actions';

describe('{p}Reducer', () => {{
  it('should work', () => {{
    const state: {c} = {{}};
    const action: DataLoaded = new DataLoaded({{}});
    const actual = {p}Reducer(state, action);
    expect(actual).toEqual({{}});
  }});
}});
"#
    )
}

fn effects(n: &Names) -> String {
    let c = &n.class_name;
    let f = &n.file_name;
    format!(
        r#"import {{ Injectable }} from '@angular/core';
import {{ Actions, Effect }} from '@ngrx/effects';
import {{ {c}Actions, {c}ActionTypes }} from './{f}.actions';

@Injectable()
export class {c}Effects {{

  @Effect()
  effect$ = this.actions$.ofType({c}ActionTypes.{c}Action);

  constructor(private actions$: Actions) {{}}
}}
"#
    )
}

fn effects_spec(n: &Names) -> String {
    let c = &n.class_name;
    let f = &n.file_name;
    format!(
        r#"import {{ TestBed }} from '@angular/core/testing';
import {{ StoreModule }} from '@ngrx/store';
import {{ provideMockActions }} from '@ngrx/effects/testing';
import {{ DataPersistence }} from '@nrwl/nx';
import {{ hot }} from '@nrwl/nx/testing';
import {{ {c}Effects }} from './{f}.effects';

describe('{c}Effects', () => {{
  let actions;
  let effects: {c}Effects;

  beforeEach(() => {{
    TestBed.configureTestingModule({{
      imports: [StoreModule.forRoot({{}})],
      providers: [
        {c}Effects,
        DataPersistence,
        provideMockActions(() => actions)
      ]
    }});

    effects = TestBed.get({c}Effects);
  }});

  describe('someEffect', () => {{
    it('should work', async () => {{
      actions = hot('-a-|', {{ a: {{ type: 'LOAD_DATA' }} }});
      expect(effects.loadData).toBeTruthy();
    }});
  }});
}});
"#
    )
}

fn init(n: &Names) -> String {
    let c = &n.class_name;
    let p = &n.property_name;
    let f = &n.file_name;
    format!(
        r#"import {{ {c} }} from './{f}.interfaces';

export const {p}InitialState: {c} = {{
  // fill it initial state here
}};
"#
    )
}

fn interfaces(n: &Names) -> String {
    let c = &n.class_name;
    let p = &n.property_name;
    format!(
        r#"/**
 * Interface for the '{p}' data used in
 *  - {c}State, and
 *  - {p}Reducer
 */
export interface {c} {{
  // define state here
}}

export interface {c}State {{
  readonly {p}: {c};
}}
"#
    )
}
