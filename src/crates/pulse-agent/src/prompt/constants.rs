//! Prompt text used by the agent and its tools.
//!
//! Placeholders use `{name}` syntax, see [`super::PromptTemplate`].

/// Example request for the endpoint tool.
pub const QUERY_ENDPOINT_REQUEST_EXAMPLE: &str = r#"
        {
          "endpoint_name": <name of the cube>,
          "params": {
            "param1": "value1",
            "param2": "value2"
          },
          "page_size": 100
        }
"#;

/// Example response shape of the endpoint tool.
pub const QUERY_ENDPOINT_RESPONSE_EXAMPLE: &str = r#"
        {
          "offset": <page offset>,
          "page_size": <number of results per page>,
          "total": <total number of records matching the sql>,
          "rows": [
            <array of records matching the sql, in dimension schema>
          ]
        }
"#;

/// Example request for the raw query tool.
pub const RAW_QUERY_REQUEST_EXAMPLE: &str = r#"
        {
          "query": "SELECT * FROM table_name WHERE condition LIMIT 100 OFFSET 0"
        }
"#;

/// Agent instructions. Needs `semantics`, `top_k` and the three example blocks.
pub const PREFIX: &str = "
Task: You are an agent that answers questions from the data in a Pulse application. Analyze the cube semantics below and use the provided tools to retrieve the data you need.

Given this cube semantics structure:
  {semantics}

How to read it:
  `cubes` is the top-level list. Each cube describes one dataset or one view of the data.
    Cube fields:
      - name: identifies the cube when calling the API.
      - description: what the cube represents.
      - dimensions: map of dimension name to its name, SQL type and description. For a cube with `sql`, the dimensions are the schema of the returned rows.
      - sql_table (optional): the SQL table backing the cube.
      - extends (optional): names of cubes this cube builds on.
      - sql (optional): a predefined query. A cube with `sql` is an endpoint; invoking it returns the rows matching that query. A cube without `sql` is a raw table that you query with your own SQL.
      - parameters (optional): map of parameter name to its name, SQL type and default value. Parameters without a default are required.
      - id (optional): unique identifier of the cube.

There are 2 ways to get data. Pick the one that fits the question:

  1. Invoke an endpoint. Only for cubes that have `sql`.
    - Check that the `sql` answers the question. If not, skip this approach.
    - Check that the `dimensions` contain what the question needs. If not, skip this approach.
    - Call the 'pulse_query_endpoint' tool with a JSON body holding \"endpoint_name\" and \"params\" for the required parameters.
    - Set \"page_size\" to {top_k} to limit the number of rows returned.
    - Example request for the 'pulse_query_endpoint' tool:
        {example_query_endpoint_request}
    - The response looks like this:
        {example_query_endpoint_response}
    - If the response does not answer the question, skip this approach.

  2. Custom query. For cubes without `sql`.
    - Use the 'pulse_generate_query' tool to write a SQL query for the request.
    - Always pass the output of 'pulse_generate_query' to the 'pulse_raw_query' tool to run it.
    - Example request for the 'pulse_raw_query' tool:
        {example_raw_query_request}

Choose the approach that best matches the question and the available cubes.
";

/// Tool listing for the text loop. Needs `tools`.
pub const REACT_TOOLS_BLOCK: &str = "You have access to the following tools:

{tools}";

/// Step format for the text loop. Needs `tool_names`.
pub const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I think I have enough information to answer the question. Based on the data retrieved, I can now answer the question.
Final Answer: the final answer to the original input question with data to support it";

/// Closing block for the text loop. Needs `input` and `agent_scratchpad`.
pub const REACT_SUFFIX: &str = "Begin!

Question: {input}
Thought: I should look at the semantics provided and question requirements to determine the best approach for getting data to answer the question.
{agent_scratchpad}";

/// Assistant priming message for the tool-calling loop.
pub const TOOL_CALLING_SUFFIX: &str = "I should look at the semantics provided and question requirements to determine the best approach for getting data to answer the question.";

/// Appended to the scratchpad when a forced run asks for a last answer.
pub const FINAL_ANSWER_NUDGE: &str = "\n\nI now need to return a final answer based on the previous steps:";

/// Output rules for SQL generation.
pub const GENERATE_QUERY_RESPONSE_FORMAT: &str = "Return only the SQL query. Do not wrap it in markdown code fences and do not add explanations.";

/// SQL generation prompt. Needs `raw_tables`, `examples`, `format_response`, `input`.
pub const GENERATE_QUERY: &str = "You are a SQL expert. Given a request, write one syntactically correct SQL query that retrieves the data needed to answer it.
Only use the tables and columns listed below. Never query columns that do not exist, and qualify ambiguous column names with their table.
Unless the request asks for a specific number of rows, limit the result to 100 rows.

Tables:
{raw_tables}
Examples of questions and the SQL that answers them:
{examples}
{format_response}

Request: {input}
SQL Query:";

/// Question suggestion prompt. Needs `cubes_yaml`, `raw_table_ids`, `predefined_sql_ids`, `count`.
pub const SUGGEST_QUESTIONS: &str = "
Given this semantics cube YAML structure:
    ------------
    {cubes_yaml}
    ------------
    Structure of the semantics cube:
        - There are two kinds of cubes: raw table cubes and predefined SQL query cubes.
            - Predefined SQL query cubes have a \"sql\" property. They run an optimized query for one analytical task, may need input parameters, and support pagination.
            - Raw table cubes have no \"sql\" property. They represent database tables and can be queried with custom SQL, including joins, sorting and aggregation.
        - A question is answered either with a predefined SQL query cube or with custom SQL over raw table cubes, never both.
        - Rely only on what the semantics describe. Make no assumptions about the schema or the data.

    A question is answerable if one of these holds:
        - Raw tables: using the raw tables {raw_table_ids} and their dimensions, the question can be turned into a SQL query.
        - Predefined SQL: one of the cubes {predefined_sql_ids} answers the question directly through its \"sql\" and dimensions, without modification or further steps.

    TASK: Suggest {count} analysis questions that can be answered with the semantics cube above.
        - Do not expose information about the data or the schema of the cube.
        - Do not include any explanation or context.
";
